use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;

use super::{
    AnalysisContext, Classification, Finding, FindingKind, MatchScope, PatternRule, Rule,
    RuleInfo, Severity
};
use crate::{document::Dialect, segment::Statement};

/// Performance rules, in evaluation order.
pub fn rules() -> Vec<Box<dyn Rule>> {
    let mut rules: Vec<Box<dyn Rule>> = PATTERNS
        .iter()
        .map(|p| Box::new(p.compile()) as Box<dyn Rule>)
        .collect();
    rules.push(Box::new(OrderByWithoutLimit));
    rules.push(Box::new(IndexSuggestion));
    rules.push(Box::new(OrChain));
    rules.push(Box::new(LargeOffset));
    rules.push(Box::new(UnionWithoutAll));
    rules
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
        kind: FindingKind::Performance,
        category,
        severity,
        classification: Classification::NONE
    }
}

const PATTERNS: &[PatternRule] = &[
    PatternRule {
        info:        info("PERF001", "SELECT * usage", "select_star", Severity::Medium),
        pattern:     r"\bSELECT\s+(?:DISTINCT\s+)?\*",
        scope:       MatchScope::Masked,
        message:     "Query uses SELECT * instead of an explicit column list",
        suggestion:  "Specify only the columns the caller needs",
        improvement: Some("Less data read and transferred; enables covering indexes")
    },
    PatternRule {
        info:        info(
            "PERF002",
            "Leading wildcard in LIKE",
            "leading_wildcard",
            Severity::High
        ),
        pattern:     r#"\bLIKE\s+N?['"]%"#,
        scope:       MatchScope::Statement,
        message:     "LIKE pattern starts with a wildcard and cannot use an index",
        suggestion:  "Use a trailing wildcard, full-text search, or a trigram index",
        improvement: Some("Index seek instead of a full table scan")
    },
    PatternRule {
        info:        info("PERF007", "NOT IN with subquery", "not_in_subquery", Severity::Medium),
        pattern:     r"\bNOT\s+IN\s*\(\s*SELECT\b",
        scope:       MatchScope::Masked,
        message:     "NOT IN with a subquery misbehaves when the subquery returns NULL",
        suggestion:  "Use NOT EXISTS or LEFT JOIN ... IS NULL instead",
        improvement: Some("Anti-join plan instead of per-row subquery evaluation")
    },
    PatternRule {
        info:        info(
            "PERF009",
            "Function on filtered column",
            "function_on_column",
            Severity::Medium
        ),
        pattern:     r"\bWHERE\s+(?:YEAR|MONTH|DAY|DATE|UPPER|LOWER|TRIM|SUBSTRING|SUBSTR|CAST|CONVERT|COALESCE)\s*\(",
        scope:       MatchScope::Masked,
        message:     "Function call on a column in WHERE prevents index usage: {match}",
        suggestion:  "Rewrite the condition as a range, or add a functional index",
        improvement: Some("Index range scan instead of evaluating the function per row")
    }
];

static ORDER_BY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bORDER\s+BY\b").expect("valid regex"));

static ROW_LIMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:LIMIT|TOP|FETCH\s+(?:FIRST|NEXT)|ROWNUM)\b").expect("valid regex")
});

static WINDOW_ORDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bOVER\s*\([^)]*$").expect("valid regex"));

/// ORDER BY without a row limit sorts the whole result
pub struct OrderByWithoutLimit;

impl Rule for OrderByWithoutLimit {
    fn info(&self) -> RuleInfo {
        info("PERF003", "ORDER BY without LIMIT", "missing_limit", Severity::Medium)
    }

    fn check(&self, statement: &Statement, ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let masked = &statement.masked;
        if ROW_LIMIT.is_match(masked) {
            return vec![];
        }
        // ORDER BY inside OVER (...) orders a window, not the result
        let Some(m) = ORDER_BY
            .find_iter(masked)
            .find(|m| !WINDOW_ORDER.is_match(&masked[..m.start()]))
        else {
            return vec![];
        };
        let limit_syntax = match ctx.dialect {
            Dialect::SqlServer => "TOP n or OFFSET ... FETCH NEXT n ROWS ONLY",
            Dialect::Oracle => "FETCH FIRST n ROWS ONLY",
            _ => "LIMIT n"
        };
        let (line, column) = statement.position(m.start());
        vec![
            Finding::new(&self.info(), line, statement.index)
                .column(column)
                .message("ORDER BY without a row limit sorts the entire result set")
                .suggestion(format!("Add {} if only the first rows are needed", limit_syntax))
                .improvement("Top-N sort instead of a full sort"),
        ]
    }
}

static WHERE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bWHERE\b").expect("valid regex"));

/// Clauses that close a WHERE clause.
static WHERE_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:WHERE|GROUP\s+BY|ORDER\s+BY|HAVING|LIMIT|OFFSET|FETCH|UNION|RETURNING|WINDOW)\b"
    )
    .expect("valid regex")
});

/// `col =` opening a WHERE clause or following AND/OR inside one.
static EQUALITY_CONDITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:WHERE|AND|OR)\s+[(\s]*([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)?)\s*="
    )
    .expect("valid regex")
});

/// Byte ranges of every WHERE clause in `masked`.
fn where_clauses(masked: &str) -> Vec<(usize, usize)> {
    WHERE_KEYWORD
        .find_iter(masked)
        .map(|w| {
            let end = WHERE_END
                .find_at(masked, w.end())
                .map_or(masked.len(), |m| m.start());
            (w.start(), end)
        })
        .collect()
}

static TARGET_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:FROM|UPDATE|JOIN)\s+([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex")
});

/// Columns compared for equality in WHERE are index candidates
pub struct IndexSuggestion;

impl Rule for IndexSuggestion {
    fn info(&self) -> RuleInfo {
        info("PERF004", "Index suggestion", "index_suggestion", Severity::Low)
    }

    fn check(&self, statement: &Statement, _ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let masked = statement.masked.as_str();
        let table = TARGET_TABLE
            .captures(masked)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str());
        let info = self.info();
        let mut seen = HashSet::new();
        where_clauses(masked)
            .into_iter()
            .flat_map(move |(start, end)| {
                EQUALITY_CONDITION
                    .captures_iter(&masked[start..end])
                    .filter_map(|caps| caps.get(1))
                    .map(move |col| (start + col.start(), col.as_str()))
            })
            .filter_map(|(offset, qualified)| {
                let column = qualified.rsplit('.').next().unwrap_or(qualified);
                seen.insert(column.to_lowercase()).then_some((offset, column))
            })
            .map(|(offset, column)| {
                let (line, pos) = statement.position(offset);
                let suggestion = match table {
                    Some(table) => format!(
                        "CREATE INDEX idx_{}_{} ON {}({})",
                        table.to_lowercase(),
                        column.to_lowercase(),
                        table,
                        column
                    ),
                    None => format!("Consider an index on '{}'", column)
                };
                Finding::new(&info, line, statement.index)
                    .column(pos)
                    .message(format!(
                        "Column '{}' is filtered by equality and is an index candidate",
                        column
                    ))
                    .suggestion(suggestion)
                    .improvement("Index lookup instead of a sequential scan")
            })
            .collect()
    }
}

static OR_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bOR\b").expect("valid regex"));

/// Multiple OR conditions on same column should use IN
pub struct OrChain;

impl Rule for OrChain {
    fn info(&self) -> RuleInfo {
        info("PERF005", "OR instead of IN", "or_chain", Severity::Low)
    }

    fn check(&self, statement: &Statement, _ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let ors: Vec<_> = OR_KEYWORD.find_iter(&statement.masked).collect();
        if ors.len() < 3 {
            return vec![];
        }
        let (line, column) = statement.position(ors[0].start());
        vec![
            Finding::new(&self.info(), line, statement.index)
                .column(column)
                .message(format!(
                    "Query has {} OR conditions, consider using IN clause",
                    ors.len()
                ))
                .suggestion("Replace multiple OR conditions with IN (val1, val2, ...)")
                .improvement("Single index range lookup instead of OR expansion"),
        ]
    }
}

static OFFSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bOFFSET\s+(\d+)").expect("valid regex"));

/// Large OFFSET values cause performance issues
pub struct LargeOffset;

impl Rule for LargeOffset {
    fn info(&self) -> RuleInfo {
        info("PERF006", "Large OFFSET value", "large_offset", Severity::Medium)
    }

    fn check(&self, statement: &Statement, _ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let Some(caps) = OFFSET.captures(&statement.masked) else {
            return vec![];
        };
        let Some(value) = caps.get(1) else {
            return vec![];
        };
        let offset: u64 = value.as_str().parse().unwrap_or(u64::MAX);
        if offset <= 1000 {
            return vec![];
        }
        let (line, column) = statement.position(value.start());
        vec![
            Finding::new(&self.info(), line, statement.index)
                .column(column)
                .message(format!(
                    "OFFSET {} is large, causing performance degradation",
                    value.as_str()
                ))
                .suggestion("Use keyset pagination (WHERE id > last_id) instead")
                .improvement("Constant-time page access instead of skipping rows"),
        ]
    }
}

static UNION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bUNION\b(\s+ALL\b)?").expect("valid regex"));

/// UNION instead of UNION ALL when duplicates don't matter
pub struct UnionWithoutAll;

impl Rule for UnionWithoutAll {
    fn info(&self) -> RuleInfo {
        info("PERF008", "UNION without ALL", "union_without_all", Severity::Low)
    }

    fn check(&self, statement: &Statement, _ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let Some(m) = UNION
            .captures_iter(&statement.masked)
            .find(|caps| caps.get(1).is_none())
            .and_then(|caps| caps.get(0))
        else {
            return vec![];
        };
        let (line, column) = statement.position(m.start());
        vec![
            Finding::new(&self.info(), line, statement.index)
                .column(column)
                .message("UNION removes duplicates which requires sorting")
                .suggestion("Use UNION ALL if duplicates are acceptable")
                .improvement("Skips the de-duplication sort"),
        ]
    }
}
