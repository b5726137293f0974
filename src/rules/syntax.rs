//! Structural checks: parentheses, required clauses, terminators and
//! misspelled keywords.

use std::sync::LazyLock;

use regex::Regex;
use sqlparser::keywords::ALL_KEYWORDS;

use super::{
    AnalysisContext, Classification, Finding, FindingKind, Fix, Rule, RuleInfo, Severity
};
use crate::{document::Dialect, segment::Statement};

/// Rules of the syntax pass, in evaluation order.
pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(UnbalancedParentheses),
        Box::new(SelectWithoutFrom),
        Box::new(MissingTerminator),
        Box::new(UnknownKeyword),
    ]
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
        kind: FindingKind::Syntax,
        category,
        severity,
        classification: Classification::NONE
    }
}

/// Opening and closing parentheses must pair up.
pub struct UnbalancedParentheses;

impl Rule for UnbalancedParentheses {
    fn info(&self) -> RuleInfo {
        info("SYN001", "Unbalanced parentheses", "unbalanced_parentheses", Severity::High)
    }

    fn check(&self, statement: &Statement, _ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let mut open = Vec::new();
        let mut stray = None;
        for (i, c) in statement.masked.char_indices() {
            match c {
                '(' => open.push(i),
                ')' if open.pop().is_none() && stray.is_none() => stray = Some(i),
                _ => {}
            }
        }
        let offset = match (stray, open.first()) {
            (Some(i), _) => i,
            (None, Some(&i)) => i,
            (None, None) => return vec![]
        };
        let opening = statement.masked.matches('(').count();
        let closing = statement.masked.matches(')').count();
        let (line, column) = statement.position(offset);
        let info = self.info();
        vec![
            Finding::new(&info, line, statement.index)
                .column(column)
                .message(format!(
                    "Unbalanced parentheses: {} opening, {} closing",
                    opening, closing
                ))
                .suggestion(if stray.is_some() {
                    "Remove the stray ')' or add the matching '('"
                } else {
                    "Close the '(' opened here"
                }),
        ]
    }
}

static FROM_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bFROM\b").expect("valid regex"));

static SELECT_ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bAS\s+\w+").expect("valid regex"));

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z_][A-Za-z0-9_$]*").expect("valid regex"));

/// Words allowed in a select list that needs no table.
const CONSTANT_WORDS: &[&str] = &[
    "ALL",
    "AND",
    "CASE",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "CURRENT_USER",
    "DAY",
    "DISTINCT",
    "ELSE",
    "END",
    "FALSE",
    "HOUR",
    "INTERVAL",
    "IS",
    "LOCALTIME",
    "LOCALTIMESTAMP",
    "MINUTE",
    "MONTH",
    "NOT",
    "NULL",
    "OR",
    "SECOND",
    "SESSION_USER",
    "SYSDATE",
    "SYSTIMESTAMP",
    "THEN",
    "TRUE",
    "UNION",
    "WHEN",
    "YEAR"
];

/// Whether a FROM-less select only computes constants, e.g.
/// `SELECT 1`, `SELECT NOW()`, `SELECT 'x' AS label`, `SELECT @@version`.
fn is_constant_select(masked_list: &str) -> bool {
    let list = SELECT_ALIAS.replace_all(masked_list, " ");
    let bytes = list.as_bytes();
    WORD.find_iter(&list).all(|m| {
        let word = m.as_str().to_uppercase();
        let prev = m.start().checked_sub(1).map(|i| bytes[i]);
        let next = list[m.end()..].trim_start().chars().next();
        prev == Some(b'@')
            || next == Some('(')
            || word == "SELECT"
            || CONSTANT_WORDS.contains(&word.as_str())
    })
}

/// SELECT must name its source, except for constant-only selects.
///
/// Oracle requires `FROM DUAL` even for constants, so the allow-list is not
/// applied there.
pub struct SelectWithoutFrom;

impl Rule for SelectWithoutFrom {
    fn info(&self) -> RuleInfo {
        info("SYN002", "SELECT without FROM", "missing_from", Severity::High)
    }

    fn check(&self, statement: &Statement, ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let masked = statement.masked.trim_start();
        let is_select = masked
            .get(..6)
            .is_some_and(|head| head.eq_ignore_ascii_case("SELECT"))
            && !masked[6..].starts_with(|c: char| c.is_alphanumeric() || c == '_');
        if !is_select || FROM_KEYWORD.is_match(masked) {
            return vec![];
        }
        if ctx.dialect != Dialect::Oracle && is_constant_select(&masked[6..]) {
            return vec![];
        }
        let info = self.info();
        let suggestion = if ctx.dialect == Dialect::Oracle {
            "Add a FROM clause (use FROM DUAL for constant expressions)"
        } else {
            "Add a FROM clause naming the source table"
        };
        vec![
            Finding::new(&info, statement.line, statement.index)
                .column(statement.column)
                .message("SELECT statement has no FROM clause")
                .suggestion(suggestion),
        ]
    }
}

/// Statements must end with `;`.
///
/// Only the final statement of a document can lack one, since segmentation
/// splits on the terminator.
pub struct MissingTerminator;

impl Rule for MissingTerminator {
    fn info(&self) -> RuleInfo {
        info("SYN003", "Missing terminator", "missing_terminator", Severity::Low)
    }

    fn check(&self, statement: &Statement, _ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        if statement.terminated {
            return vec![];
        }
        let last_line = statement.last_line();
        let last_line_start = statement.text.rfind('\n').map_or(0, |nl| nl + 1);
        // rewrite only the final token; keyword fixes may touch the rest
        let token = last_line
            .rsplit(char::is_whitespace)
            .next()
            .unwrap_or(last_line);
        let token_start = last_line_start + last_line.len() - token.len();
        let info = self.info();
        vec![
            Finding::new(&info, statement.end_line, statement.index)
                .column(
                    statement
                        .position(last_line_start + last_line.len())
                        .1
                )
                .message("Statement is not terminated with ';'")
                .suggestion("Append ';' to the end of the statement")
                .fix(
                    Fix::new(token, format!("{};", token))
                        .anchored(statement.offset + token_start)
                ),
        ]
    }
}

/// Common keywords offered as corrections for misspellings.
const SUGGESTABLE_KEYWORDS: &[&str] = &[
    "SELECT",
    "FROM",
    "WHERE",
    "INSERT",
    "INTO",
    "VALUES",
    "UPDATE",
    "DELETE",
    "SET",
    "JOIN",
    "INNER",
    "LEFT",
    "RIGHT",
    "OUTER",
    "FULL",
    "CROSS",
    "GROUP",
    "ORDER",
    "HAVING",
    "LIMIT",
    "OFFSET",
    "UNION",
    "DISTINCT",
    "CREATE",
    "TABLE",
    "ALTER",
    "DROP",
    "INDEX",
    "PRIMARY",
    "FOREIGN",
    "REFERENCES",
    "CONSTRAINT",
    "DEFAULT",
    "NULL",
    "NOT",
    "AND",
    "BETWEEN",
    "LIKE",
    "EXISTS",
    "CASE",
    "WHEN",
    "THEN",
    "ELSE",
    "END",
    "VIEW",
    "TRUNCATE",
    "GRANT",
    "REVOKE",
    "BEGIN",
    "COMMIT",
    "ROLLBACK",
    "RETURNING",
    "WITH",
    "UNIQUE",
    "CHECK",
    "DESC",
    "ASC"
];

const MAX_KEYWORD_DISTANCE: usize = 2;

/// Function names that are valid uppercase tokens.
const FUNCTIONS: &[&str] = &[
    "ABS",
    "ARRAY_AGG",
    "AVG",
    "BENCHMARK",
    "CAST",
    "CEIL",
    "CEILING",
    "COALESCE",
    "CONCAT",
    "CONVERT",
    "COUNT",
    "DATEADD",
    "DATEDIFF",
    "DATE_ADD",
    "DATE_FORMAT",
    "DATE_SUB",
    "DECODE",
    "DENSE_RANK",
    "EXTRACT",
    "FIRST_VALUE",
    "FLOOR",
    "GETDATE",
    "GROUP_CONCAT",
    "IFNULL",
    "IIF",
    "INSTR",
    "ISNULL",
    "JSON_EXTRACT",
    "LAG",
    "LAST_VALUE",
    "LEAD",
    "LEN",
    "LENGTH",
    "LISTAGG",
    "LOAD_FILE",
    "LOWER",
    "LTRIM",
    "MAX",
    "MD5",
    "MIN",
    "NOW",
    "NTILE",
    "NULLIF",
    "NVL",
    "NVL2",
    "PG_SLEEP",
    "POSITION",
    "RAND",
    "RANDOM",
    "RANK",
    "REPLACE",
    "ROUND",
    "ROW_NUMBER",
    "RTRIM",
    "SHA1",
    "SHA2",
    "SLEEP",
    "STRING_AGG",
    "STR_TO_DATE",
    "SUBSTR",
    "SUBSTRING",
    "SUM",
    "TO_CHAR",
    "TO_DATE",
    "TO_NUMBER",
    "TRIM",
    "UPPER",
    "UUID",
    "VERSION"
];

/// Dialect-specific vocabulary not covered by the generic keyword list.
fn dialect_keywords(dialect: Dialect) -> &'static [&'static str] {
    match dialect {
        Dialect::MySql => &[
            "AUTO_INCREMENT",
            "ENGINE",
            "INNODB",
            "MYISAM",
            "UNSIGNED",
            "ZEROFILL",
            "TINYINT",
            "MEDIUMINT",
            "MEDIUMTEXT",
            "LONGTEXT",
            "CHARSET"
        ],
        Dialect::PostgreSql => &["SERIAL", "BIGSERIAL", "SMALLSERIAL", "ILIKE", "JSONB", "BYTEA"],
        Dialect::Oracle => &[
            "ROWNUM", "ROWID", "VARCHAR2", "NVARCHAR2", "NUMBER", "PRIOR", "DUAL", "CLOB",
            "MINUS"
        ],
        Dialect::SqlServer => &[
            "NVARCHAR",
            "IDENTITY",
            "TOP",
            "UNIQUEIDENTIFIER",
            "DATETIME2",
            "NOLOCK",
            "MONEY"
        ],
        Dialect::Sqlite => &["PRAGMA", "AUTOINCREMENT", "WITHOUT", "ROWID", "VACUUM", "GLOB"],
        Dialect::Generic => &[]
    }
}

/// Whether a token is part of the known keyword/function vocabulary.
pub fn is_known_word(token: &str, dialect: Dialect) -> bool {
    ALL_KEYWORDS.binary_search(&token).is_ok()
        || FUNCTIONS.contains(&token)
        || dialect_keywords(dialect).contains(&token)
}

/// Classic dynamic-programming edit distance.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Nearest suggestable keyword at most two edits away.
pub fn nearest_keyword(token: &str) -> Option<&'static str> {
    SUGGESTABLE_KEYWORDS
        .iter()
        .map(|kw| (levenshtein(token, kw), *kw))
        .filter(|(distance, _)| (1..=MAX_KEYWORD_DISTANCE).contains(distance))
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, kw)| kw)
}

static UPPER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][A-Z_]{2,}\b").expect("valid regex"));

/// Words after which an uppercase token names an object, not a keyword.
const OBJECT_POSITION: &[&str] = &["FROM", "JOIN", "INTO", "UPDATE", "TABLE", "AS"];

/// Uppercase tokens that look like misspelled keywords.
pub struct UnknownKeyword;

impl Rule for UnknownKeyword {
    fn info(&self) -> RuleInfo {
        info("SYN004", "Unknown keyword", "unknown_keyword", Severity::Medium)
    }

    fn check(&self, statement: &Statement, ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let masked = &statement.masked;
        let bytes = masked.as_bytes();
        let info = self.info();
        let mut findings = Vec::new();
        for m in UPPER_TOKEN.find_iter(masked) {
            let token = m.as_str();
            let prev = m.start().checked_sub(1).map(|i| bytes[i]);
            let next = bytes.get(m.end()).copied();
            if matches!(prev, Some(b'.' | b'`' | b'[' | b'@' | b'$' | b':'))
                || matches!(next, Some(b'.' | b'`' | b']'))
                || is_known_word(token, ctx.dialect)
            {
                continue;
            }
            let previous_word = masked[..m.start()]
                .split_whitespace()
                .next_back()
                .map(str::to_uppercase);
            if previous_word.is_some_and(|w| OBJECT_POSITION.contains(&w.as_str())) {
                continue;
            }
            let Some(keyword) = nearest_keyword(token) else {
                continue;
            };
            let (line, column) = statement.position(m.start());
            findings.push(
                Finding::new(&info, line, statement.index)
                    .column(column)
                    .message(format!("Unknown keyword '{}'", token))
                    .suggestion(format!("Did you mean '{}'?", keyword))
                    .fix(Fix::new(token, keyword).anchored(statement.offset + m.start()))
            );
        }
        findings
    }
}
