//! Type definitions for the rule system.
//!
//! - [`Severity`] - Finding severity levels (low to critical)
//! - [`FindingKind`] - Which analyzer pass produced a finding
//! - [`Finding`] - A single reported issue with position and optional fix
//! - [`Fix`] - Mechanically applicable text replacement
//! - [`Classification`] - CWE / OWASP tags carried by security findings

use serde::Serialize;

/// Severity level of a finding.
///
/// Ordered from lowest to highest for sorting and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical
}

impl Severity {
    /// Parse a severity name as used in configuration files.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" | "info" => Some(Self::Low),
            "medium" | "warning" | "warn" => Some(Self::Medium),
            "high" | "error" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL")
        }
    }
}

/// Analyzer category a finding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Syntax,
    Semantic,
    Performance,
    Security,
    Schema
}

impl std::fmt::Display for FindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax => write!(f, "Syntax"),
            Self::Semantic => write!(f, "Semantic"),
            Self::Performance => write!(f, "Performance"),
            Self::Security => write!(f, "Security"),
            Self::Schema => write!(f, "Schema")
        }
    }
}

/// Text replacement that corrects a finding.
///
/// Applied to the first occurrence of `original` at or after `anchor` (a
/// byte offset in the source document), or at or after the start of the
/// finding's line when no anchor is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fix {
    pub original:    String,
    pub replacement: String,
    #[serde(skip)]
    pub anchor:      Option<usize>
}

impl Fix {
    pub fn new(original: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            original:    original.into(),
            replacement: replacement.into(),
            anchor:      None
        }
    }

    pub fn anchored(mut self, offset: usize) -> Self {
        self.anchor = Some(offset);
        self
    }

    /// Replace the first occurrence of `original` at or after byte `from`.
    ///
    /// Returns `None` when the fragment does not occur.
    pub fn apply(&self, text: &str, from: usize) -> Option<String> {
        let from = from.min(text.len());
        let pos = text.get(from..)?.find(&self.original)? + from;
        let mut out = String::with_capacity(text.len() + self.replacement.len());
        out.push_str(&text[..pos]);
        out.push_str(&self.replacement);
        out.push_str(&text[pos + self.original.len()..]);
        Some(out)
    }
}

/// Vulnerability classification tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub cwe:   Option<&'static str>,
    pub owasp: Option<&'static str>
}

impl Classification {
    pub const NONE: Self = Self {
        cwe:   None,
        owasp: None
    };

    pub const fn new(cwe: &'static str, owasp: &'static str) -> Self {
        Self {
            cwe:   Some(cwe),
            owasp: Some(owasp)
        }
    }

    pub const fn cwe(cwe: &'static str) -> Self {
        Self {
            cwe:   Some(cwe),
            owasp: None
        }
    }
}

/// A single reported issue.
///
/// Findings are produced by exactly one analyzer pass and are never mutated
/// after the pass completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Rule identifier (e.g., "SYN001", "SEC004")
    pub rule_id:               &'static str,
    /// Analyzer pass that produced the finding
    pub kind:                  FindingKind,
    /// Machine-readable category (e.g., "missing_where")
    pub category:              &'static str,
    pub severity:              Severity,
    /// 1-based document line
    pub line:                  usize,
    /// 1-based column when the position is known precisely
    pub column:                Option<usize>,
    /// Zero-based index of the statement the finding refers to
    pub statement_index:       usize,
    pub message:               String,
    pub suggestion:            String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix:                   Option<Fix>,
    #[serde(flatten)]
    pub classification:        Classification,
    /// Free-text expected gain, reported for performance findings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_improvement: Option<String>
}

impl Finding {
    pub fn new(info: &RuleInfo, line: usize, statement_index: usize) -> Self {
        Self {
            rule_id: info.id,
            kind: info.kind,
            category: info.category,
            severity: info.severity,
            line,
            column: None,
            statement_index,
            message: String::new(),
            suggestion: String::new(),
            fix: None,
            classification: info.classification,
            estimated_improvement: None
        }
    }

    pub fn column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    pub fn fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn improvement(mut self, estimate: impl Into<String>) -> Self {
        self.estimated_improvement = Some(estimate.into());
        self
    }
}

/// Metadata about a rule for identification and configuration.
#[derive(Debug, Clone, Copy)]
pub struct RuleInfo {
    /// Unique rule identifier (e.g., "PERF001")
    pub id:             &'static str,
    /// Human-readable rule name
    pub name:           &'static str,
    pub kind:           FindingKind,
    pub category:       &'static str,
    /// Default severity level
    pub severity:       Severity,
    pub classification: Classification
}
