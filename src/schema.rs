//! Table model extraction from `CREATE TABLE` statements.
//!
//! The extractor is pattern based: it recognizes the `CREATE TABLE` header,
//! finds the parenthesized body on the literal-masked text (so quoted
//! identifiers and defaults cannot unbalance it) and splits it on top-level
//! commas. Each element becomes a column, the table primary key,
//! a foreign key or a free-text constraint.
//!
//! # Supported Elements
//!
//! - Columns with declared type and trailing constraint text
//! - Inline `PRIMARY KEY` and `REFERENCES t(c)` column constraints
//! - Table-level `PRIMARY KEY (...)` and `FOREIGN KEY (...) REFERENCES ...`,
//!   optionally named with `CONSTRAINT name`
//! - `UNIQUE`, `CHECK`, `INDEX`, `KEY` kept as constraint text
//!
//! Foreign keys from all tables are accumulated into one relationship list.
//! No other cross-statement merging happens.
//!
//! # Example
//!
//! ```
//! use sql_lens::{config::RulesConfig, schema, segment::segment};
//!
//! let statements = segment(
//!     "CREATE TABLE users (id INT PRIMARY KEY, email VARCHAR(255) NOT NULL);"
//! );
//! let extraction = schema::extract(&statements, &RulesConfig::default());
//!
//! let users = &extraction.tables[0];
//! assert_eq!(users.name, "users");
//! assert_eq!(users.columns.len(), 2);
//! assert_eq!(users.primary_key.as_slice(), ["id"]);
//! ```

use std::{collections::HashSet, sync::LazyLock};

use compact_str::CompactString;
use regex::Regex;
use serde::Serialize;
use smallvec::SmallVec;

use crate::{
    config::RulesConfig,
    rules::{Classification, Finding, FindingKind, RuleInfo, Severity},
    segment::Statement
};

/// Column descriptor extracted from a table body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name:        CompactString,
    /// Declared type including arguments (e.g., "VARCHAR(255)")
    pub data_type:   String,
    /// Everything after the type (e.g., "NOT NULL DEFAULT 0")
    pub constraints: String
}

/// Foreign-key edge from a column of the owning table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub column:        CompactString,
    pub target_table:  CompactString,
    pub target_column: Option<CompactString>
}

/// Table definition extracted from one `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableModel {
    pub name:            CompactString,
    /// 1-based line of the `CREATE TABLE` statement
    pub line:            usize,
    pub statement_index: usize,
    /// Columns in declaration order
    pub columns:         Vec<Column>,
    pub primary_key:     SmallVec<[CompactString; 2]>,
    pub foreign_keys:    Vec<ForeignKey>,
    /// Table-level constraints other than primary and foreign keys
    pub constraints:     Vec<String>
}

impl TableModel {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Foreign-key relationship between two tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub from_table:  CompactString,
    pub from_column: CompactString,
    pub to_table:    CompactString,
    pub to_column:   Option<CompactString>
}

/// Result of the schema pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaExtraction {
    pub tables:        Vec<TableModel>,
    pub relationships: Vec<Relationship>,
    pub findings:      Vec<Finding>
}

const fn info(
    id: &'static str,
    name: &'static str,
    category: &'static str,
    severity: Severity
) -> RuleInfo {
    RuleInfo {
        id,
        name,
        kind: FindingKind::Schema,
        category,
        severity,
        classification: Classification::NONE
    }
}

pub const MISSING_PRIMARY_KEY: RuleInfo = info(
    "SCH001",
    "Table without primary key",
    "missing_primary_key",
    Severity::Medium
);

pub const UNDECLARED_REFERENCE: RuleInfo = info(
    "SCH002",
    "Foreign key to undeclared table",
    "undeclared_reference",
    Severity::Low
);

pub const UNPARSED_TABLE: RuleInfo = info(
    "SCH003",
    "Unparseable table definition",
    "unparsed_table",
    Severity::Low
);

static CREATE_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)^CREATE\s+(?:OR\s+REPLACE\s+)?(?:(?:GLOBAL|LOCAL)\s+)?(?:TEMP(?:ORARY)?\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?((?:[`"\[]?[\w$]+[`"\]]?\.){0,2}[`"\[]?[\w$]+[`"\]]?)\s*\("#
    )
    .expect("valid regex")
});

static FOREIGN_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)^FOREIGN\s+KEY\s*(?:[`"\[]?[\w$]+[`"\]]?\s*)?\(([^)]*)\)\s*REFERENCES\s+([^\s(]+)\s*(?:\(([^)]*)\))?"#
    )
    .expect("valid regex")
});

static INLINE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\bREFERENCES\s+([^\s(]+)\s*(?:\(([^)]*)\))?"#).expect("valid regex")
});

static PRIMARY_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^PRIMARY\s+KEY\b[^(]*\(([^)]*)\)").expect("valid regex")
});

static INLINE_PRIMARY_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").expect("valid regex"));

static CONSTRAINT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^CONSTRAINT\s+[`"\[]?[\w$]+[`"\]]?\s+"#).expect("valid regex")
});

/// Words that end a column's declared type.
const COLUMN_CONSTRAINT_WORDS: &[&str] = &[
    "NOT",
    "NULL",
    "PRIMARY",
    "REFERENCES",
    "DEFAULT",
    "UNIQUE",
    "CHECK",
    "CONSTRAINT",
    "AUTO_INCREMENT",
    "AUTOINCREMENT",
    "IDENTITY",
    "GENERATED",
    "COLLATE",
    "COMMENT",
    "ON",
    "CHARACTER",
    "CHARSET"
];

/// Leading words of table-level elements that are not columns.
const TABLE_CONSTRAINT_WORDS: &[&str] = &[
    "UNIQUE", "CHECK", "INDEX", "KEY", "FULLTEXT", "SPATIAL", "EXCLUDE", "PERIOD"
];

/// Extract table models, relationships and schema findings.
///
/// Disabled schema rules are dropped and severity overrides applied, the
/// same way the rule runner treats the other passes.
pub fn extract(statements: &[Statement], config: &RulesConfig) -> SchemaExtraction {
    let mut extraction = SchemaExtraction::default();
    let mut unparsed = Vec::new();

    for statement in statements {
        let Some(caps) = CREATE_TABLE.captures(&statement.text) else {
            continue;
        };
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let name = unquote_path(name.as_str());
        let open = whole.end() - 1;
        match parse_table(statement, &name, open) {
            Some(table) => extraction.tables.push(table),
            None => unparsed.push(
                Finding::new(&UNPARSED_TABLE, statement.line, statement.index)
                    .column(statement.column)
                    .message(format!("Could not parse the definition of table '{}'", name))
                    .suggestion("Check the column list for unbalanced parentheses or quotes")
            )
        }
    }

    let declared: HashSet<String> = extraction
        .tables
        .iter()
        .flat_map(|t| {
            [
                t.name.to_lowercase().to_string(),
                base_name(&t.name).to_lowercase()
            ]
        })
        .collect();

    let mut findings = Vec::new();
    for table in &extraction.tables {
        if table.primary_key.is_empty() {
            findings.push(
                Finding::new(&MISSING_PRIMARY_KEY, table.line, table.statement_index)
                    .message(format!("Table '{}' has no primary key", table.name))
                    .suggestion("Add a PRIMARY KEY so rows can be identified and joined efficiently")
            );
        }
        for fk in &table.foreign_keys {
            extraction.relationships.push(Relationship {
                from_table:  table.name.clone(),
                from_column: fk.column.clone(),
                to_table:    fk.target_table.clone(),
                to_column:   fk.target_column.clone()
            });
            let target = fk.target_table.to_lowercase();
            if !declared.contains(target.as_str()) && !declared.contains(base_name(&target)) {
                findings.push(
                    Finding::new(&UNDECLARED_REFERENCE, table.line, table.statement_index)
                        .message(format!(
                            "Foreign key '{}.{}' references table '{}' which is not declared here",
                            table.name, fk.column, fk.target_table
                        ))
                        .suggestion("Declare the referenced table or check the table name")
                );
            }
        }
    }
    findings.extend(unparsed);
    findings.sort_by_key(|f| f.statement_index);

    extraction.findings = findings
        .into_iter()
        .filter(|f| !config.is_disabled(f.rule_id))
        .map(|mut f| {
            if let Some(severity) = config.severity_for(f.rule_id) {
                f.severity = severity;
            }
            f
        })
        .collect();
    extraction
}

fn parse_table(statement: &Statement, name: &str, open: usize) -> Option<TableModel> {
    let close = matching_paren(&statement.masked, open)?;
    let mut table = TableModel {
        name:            name.into(),
        line:            statement.line,
        statement_index: statement.index,
        columns:         Vec::new(),
        primary_key:     SmallVec::new(),
        foreign_keys:    Vec::new(),
        constraints:     Vec::new()
    };

    for (start, end) in split_top_level(&statement.masked, open + 1, close) {
        let element = statement.text[start..end].trim();
        if element.is_empty() {
            continue;
        }
        let unnamed = match CONSTRAINT_NAME.find(element) {
            Some(m) => &element[m.end()..],
            None => element
        };
        let first = first_word(unnamed).to_uppercase();

        if let Some(caps) = PRIMARY_KEY.captures(unnamed) {
            let columns = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            table.primary_key.extend(column_list(columns));
        } else if let Some(caps) = FOREIGN_KEY.captures(unnamed) {
            let sources = column_list(caps.get(1).map(|m| m.as_str()).unwrap_or_default());
            let target = unquote_path(caps.get(2).map(|m| m.as_str()).unwrap_or_default());
            let targets = column_list(caps.get(3).map(|m| m.as_str()).unwrap_or_default());
            for (i, column) in sources.into_iter().enumerate() {
                table.foreign_keys.push(ForeignKey {
                    column,
                    target_table: target.as_str().into(),
                    target_column: targets.get(i).cloned()
                });
            }
        } else if first == "CONSTRAINT"
            || first == "PRIMARY"
            || first == "FOREIGN"
            || TABLE_CONSTRAINT_WORDS.contains(&first.as_str())
        {
            table.constraints.push(element.to_string());
        } else {
            parse_column(&mut table, element);
        }
    }

    if table.columns.is_empty() {
        return None;
    }
    Some(table)
}

fn parse_column(table: &mut TableModel, element: &str) {
    let (raw_name, rest) = split_identifier(element);
    let name: CompactString = unquote(raw_name).into();
    let (data_type, constraints) = split_type(rest);

    if INLINE_PRIMARY_KEY.is_match(constraints) && !table.primary_key.contains(&name) {
        table.primary_key.push(name.clone());
    }
    if let Some(caps) = INLINE_REFERENCE.captures(constraints) {
        let target = unquote_path(caps.get(1).map(|m| m.as_str()).unwrap_or_default());
        let target_column = caps
            .get(2)
            .and_then(|m| column_list(m.as_str()).into_iter().next());
        table.foreign_keys.push(ForeignKey {
            column: name.clone(),
            target_table: target.as_str().into(),
            target_column
        });
    }

    table.columns.push(Column {
        name,
        data_type: data_type.to_string(),
        constraints: constraints.to_string()
    });
}

/// Byte index of the `)` closing the `(` at `open`.
fn matching_paren(masked: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in masked.bytes().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Ranges between commas at parenthesis depth zero within `start..end`.
fn split_top_level(masked: &str, start: usize, end: usize) -> Vec<(usize, usize)> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut from = start;
    for (i, b) in masked.as_bytes()[start..end].iter().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push((from, start + i));
                from = start + i + 1;
            }
            _ => {}
        }
    }
    parts.push((from, end));
    parts
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn first_word(text: &str) -> &str {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or_default()
}

/// Split a leading, possibly quoted, identifier from the rest.
fn split_identifier(element: &str) -> (&str, &str) {
    let close = match element.chars().next() {
        Some('"') => Some('"'),
        Some('`') => Some('`'),
        Some('[') => Some(']'),
        _ => None
    };
    let end = match close {
        Some(close) => element[1..]
            .find(close)
            .map(|i| i + 2)
            .unwrap_or(element.len()),
        None => element
            .find(char::is_whitespace)
            .unwrap_or(element.len())
    };
    (&element[..end], element[end..].trim())
}

/// Split a column definition tail into declared type and constraint text.
fn split_type(rest: &str) -> (&str, &str) {
    let bytes = rest.as_bytes();
    let mut depth = 0usize;
    for (i, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0
                && (c.is_ascii_alphabetic() || c == '_')
                && (i == 0 || !is_word_byte(bytes[i - 1])) =>
            {
                let word = first_word(&rest[i..]);
                if COLUMN_CONSTRAINT_WORDS
                    .iter()
                    .any(|w| w.eq_ignore_ascii_case(word))
                {
                    return (rest[..i].trim(), rest[i..].trim());
                }
            }
            _ => {}
        }
    }
    (rest.trim(), "")
}

fn unquote(ident: &str) -> &str {
    ident.trim().trim_matches(|c| matches!(c, '"' | '`' | '[' | ']'))
}

fn unquote_path(path: &str) -> String {
    path.split('.').map(unquote).collect::<Vec<_>>().join(".")
}

fn base_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Column names from a parenthesized list, ignoring sort order and prefix
/// lengths (`name(10) DESC`).
fn column_list(list: &str) -> Vec<CompactString> {
    list.split(',')
        .map(|item| {
            let (ident, _) = split_identifier(item.trim());
            let ident = ident.split('(').next().unwrap_or(ident);
            CompactString::from(unquote(ident))
        })
        .filter(|name| !name.is_empty())
        .collect()
}
