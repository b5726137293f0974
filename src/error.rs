pub use masterror::{AppError, AppResult};

/// Create file read error
pub fn file_read_error(path: &str, source: std::io::Error) -> AppError {
    AppError::internal(format!("Failed to read file '{}': {}", path, source))
}

/// Create config error
pub fn config_error(message: impl Into<String>) -> AppError {
    AppError::bad_request(message.into())
}

/// Create output serialization error
pub fn output_error(format: &str, message: impl std::fmt::Display) -> AppError {
    AppError::internal(format!("Failed to render {} output: {}", format, message))
}

/// Reason an analyzer pass could not complete.
///
/// Produced when a pass panics; the engine turns it into a single critical
/// finding for that pass instead of failing the whole analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassFault {
    pub pass:   &'static str,
    pub reason: String
}

impl PassFault {
    /// Build a fault from a panic payload.
    pub fn from_panic(pass: &'static str, payload: &(dyn std::any::Any + Send)) -> Self {
        let reason = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Self {
            pass,
            reason
        }
    }
}

impl std::fmt::Display for PassFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} analyzer failed: {}", self.pass, self.reason)
    }
}

impl std::error::Error for PassFault {}
