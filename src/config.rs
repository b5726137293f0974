//! Configuration loading and management.
//!
//! Configuration is loaded from multiple sources with the following precedence
//! (highest to lowest):
//!
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. `.sql-lens.toml` in current directory
//! 4. `~/.config/sql-lens/config.toml`
//! 5. Default values
//!
//! # Configuration File Format
//!
//! ```toml
//! [analysis]
//! dialect = "mysql"            # default dialect hint
//!
//! [cache]
//! ttl_secs = 300               # 0 or absent: entries never expire
//!
//! [rules]
//! disabled = ["PERF007", "SEC020"]
//!
//! [rules.severity]
//! PERF001 = "high"
//! SYN003 = "medium"
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `SQL_LENS_DIALECT` | Default dialect hint |
//! | `SQL_LENS_CACHE_TTL` | Cache time-to-live in seconds |

use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
    time::Duration
};

use serde::Deserialize;

use crate::{
    document::Dialect,
    error::{AppResult, config_error},
    rules::Severity
};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub cache:    CacheConfig,
    #[serde(default)]
    pub rules:    RulesConfig
}

/// Analysis defaults
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AnalysisConfig {
    /// Dialect used when the caller gives no hint; detection runs otherwise
    pub dialect: Option<Dialect>
}

/// Analysis cache configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CacheConfig {
    pub ttl_secs: Option<u64>
}

impl CacheConfig {
    /// Entry time-to-live; `None` keeps entries forever.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Rules configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RulesConfig {
    /// Disabled rule IDs
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Severity overrides (rule_id -> severity)
    #[serde(default)]
    pub severity: HashMap<String, String>
}

impl RulesConfig {
    pub fn is_disabled(&self, rule_id: &str) -> bool {
        self.disabled.iter().any(|d| d.eq_ignore_ascii_case(rule_id))
    }

    /// Severity override for a rule, ignoring unknown severity names.
    pub fn severity_for(&self, rule_id: &str) -> Option<Severity> {
        self.severity
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(rule_id))
            .and_then(|(_, sev)| Severity::parse(sev))
    }
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file in current directory (.sql-lens.toml)
    /// 3. Config file in home directory (~/.config/sql-lens/config.toml)
    /// 4. Default values
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(home) = env::var_os("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sql-lens")
                .join("config.toml");
            if home_config.exists() {
                config = Self::from_file(&home_config)?;
            }
        }

        let local_config = PathBuf::from(".sql-lens.toml");
        if local_config.exists() {
            config = Self::from_file(&local_config)?;
        }

        config.apply_env()?;
        Ok(config)
    }

    /// Parse a single TOML configuration file.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| config_error(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| config_error(format!("Invalid config file: {}", e)))
    }

    fn apply_env(&mut self) -> AppResult<()> {
        if let Ok(dialect) = env::var("SQL_LENS_DIALECT") {
            let parsed = dialect
                .parse::<Dialect>()
                .map_err(|e| config_error(format!("SQL_LENS_DIALECT: {}", e)))?;
            self.analysis.dialect = Some(parsed);
        }
        if let Ok(ttl) = env::var("SQL_LENS_CACHE_TTL") {
            let secs = ttl
                .parse::<u64>()
                .map_err(|e| config_error(format!("SQL_LENS_CACHE_TTL: {}", e)))?;
            self.cache.ttl_secs = Some(secs);
        }
        Ok(())
    }
}
