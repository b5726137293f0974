//! # sql-lens
//!
//! Rule-based static analysis of SQL text.
//!
//! `sql-lens` takes raw SQL source, splits it into statements while
//! respecting quoted literals and comments, and runs four independent
//! analyzer passes over them:
//!
//! 1. **Syntax** - unbalanced parentheses, `SELECT` without `FROM`, missing
//!    terminators, misspelled keywords (with edit-distance suggestions)
//! 2. **Semantic / Performance** - `UPDATE`/`DELETE` without `WHERE`,
//!    `GROUP BY`/`HAVING` misuse, `SELECT *`, leading-wildcard `LIKE`,
//!    unbounded sorts, index suggestions
//! 3. **Security** - injection signatures, dangerous functions, privilege
//!    changes, hard-coded credentials, catalog access; each tagged with CWE
//!    and OWASP categories
//! 4. **Schema** - table models and foreign-key relationships from
//!    `CREATE TABLE`
//!
//! The results are combined into an immutable [`AnalysisResult`] with
//! quality and complexity scores, deduplicated recommendations and an
//! auto-corrected copy of the SQL annotated with comments. Results are
//! memoized by content hash.
//!
//! # Quick Start
//!
//! ```
//! use sql_lens::{config::Config, engine::Engine};
//!
//! let engine = Engine::new(&Config::default());
//! let result = engine.analyze("SELECT * FROM users WHERE name = '' OR '1'='1';", None);
//!
//! assert!(
//!     result
//!         .security_vulnerabilities
//!         .iter()
//!         .any(|f| f.classification.cwe == Some("CWE-89"))
//! );
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded from (in order of precedence):
//!
//! 1. Command-line arguments
//! 2. Environment variables (`SQL_LENS_DIALECT`, `SQL_LENS_CACHE_TTL`)
//! 3. `.sql-lens.toml` in current directory
//! 4. `~/.config/sql-lens/config.toml`
//!
//! See [`config`] for the file format.
//!
//! # Exit Codes
//!
//! The `sql-lens` binary exits with the highest severity found:
//!
//! - `0` - No findings, or only low severity
//! - `1` - Medium findings
//! - `2` - High or critical findings
//!
//! # Modules
//!
//! - [`segment`] - Statement segmentation and literal masking
//! - [`document`] - Source documents, dialects, content hashing
//! - [`rules`] - Rule engine and built-in rule families
//! - [`schema`] - `CREATE TABLE` extraction
//! - [`synthesis`] - Scoring, recommendations, corrected SQL
//! - [`engine`] - Pass orchestration and fault isolation
//! - [`cache`] - Compute-once result cache
//! - [`config`] - Configuration loading
//! - [`output`] - Text, JSON and YAML rendering
//! - [`error`] - Error types and constructors
//!
//! [`AnalysisResult`]: synthesis::AnalysisResult

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod output;
pub mod rules;
pub mod schema;
pub mod segment;
pub mod synthesis;
