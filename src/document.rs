//! Source documents and dialect detection.
//!
//! A [`SourceDocument`] is the immutable input of one analysis: the raw SQL
//! text, an optional dialect hint and a SHA-256 digest of the bytes. The
//! digest is the identity used by the [`cache`](crate::cache).
//!
//! # Example
//!
//! ```
//! use sql_lens::document::{Dialect, SourceDocument};
//!
//! let doc = SourceDocument::new("CREATE TABLE t (id SERIAL PRIMARY KEY);", None);
//!
//! assert_eq!(doc.dialect(), Dialect::PostgreSql);
//! assert_eq!(doc.line_count(), 1);
//! assert_eq!(doc.content_hash().len(), 64);
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Target database family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    #[serde(rename = "mysql")]
    MySql,
    #[serde(rename = "postgresql")]
    PostgreSql,
    Oracle,
    SqlServer,
    Sqlite,
    #[default]
    Generic
}

/// Signature substrings checked in order; the first hit wins.
const DIALECT_SIGNATURES: &[(&str, Dialect)] = &[
    ("AUTO_INCREMENT", Dialect::MySql),
    ("ENGINE=", Dialect::MySql),
    ("ENGINE =", Dialect::MySql),
    ("SERIAL", Dialect::PostgreSql),
    ("RETURNING", Dialect::PostgreSql),
    ("ROWNUM", Dialect::Oracle),
    ("CONNECT BY", Dialect::Oracle),
    ("IDENTITY(", Dialect::SqlServer),
    ("NVARCHAR", Dialect::SqlServer),
    ("PRAGMA", Dialect::Sqlite)
];

impl Dialect {
    /// Best-effort dialect detection from signature substrings.
    ///
    /// Falls back to [`Dialect::Generic`] when nothing matches.
    pub fn detect(sql: &str) -> Self {
        let upper = sql.to_uppercase();
        DIALECT_SIGNATURES
            .iter()
            .find(|(signature, _)| upper.contains(signature))
            .map(|(_, dialect)| *dialect)
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::PostgreSql => "postgresql",
            Self::Oracle => "oracle",
            Self::SqlServer => "sql_server",
            Self::Sqlite => "sqlite",
            Self::Generic => "generic"
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "mysql" => Ok(Self::MySql),
            "postgresql" | "postgres" => Ok(Self::PostgreSql),
            "oracle" => Ok(Self::Oracle),
            "sql_server" | "sqlserver" | "mssql" => Ok(Self::SqlServer),
            "sqlite" => Ok(Self::Sqlite),
            "generic" => Ok(Self::Generic),
            other => Err(format!("unknown dialect '{}'", other))
        }
    }
}

/// Immutable analysis input.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    text:         String,
    declared:     Option<Dialect>,
    dialect:      Dialect,
    content_hash: String,
    line_count:   usize
}

impl SourceDocument {
    /// Wrap raw text, hashing it and resolving the effective dialect.
    pub fn new(text: impl Into<String>, declared: Option<Dialect>) -> Self {
        let text = text.into();
        let content_hash = content_hash(&text);
        let dialect = declared.unwrap_or_else(|| Dialect::detect(&text));
        let line_count = text.lines().count();
        Self {
            text,
            declared,
            dialect,
            content_hash,
            line_count
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Dialect hint supplied by the caller, if any.
    pub fn declared_dialect(&self) -> Option<Dialect> {
        self.declared
    }

    /// Declared dialect, or the detected one when no hint was given.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Lowercase hex SHA-256 of the document bytes.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }
}

/// Stable digest of the given text.
pub fn content_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
