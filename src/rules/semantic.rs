use std::sync::LazyLock;

use regex::Regex;

use super::{AnalysisContext, Classification, Finding, FindingKind, Rule, RuleInfo, Severity};
use crate::segment::Statement;

/// Semantic rules, in evaluation order.
pub fn rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(MissingWhereInUpdate),
        Box::new(MissingWhereInDelete),
        Box::new(GroupByWithoutAggregate),
        Box::new(HavingWithoutGroupBy),
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
        kind: FindingKind::Semantic,
        category,
        severity,
        classification: Classification::NONE
    }
}

static WHERE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bWHERE\b").expect("valid regex"));

static GROUP_BY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bGROUP\s+BY\b").expect("valid regex"));

static HAVING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bHAVING\b").expect("valid regex"));

static AGGREGATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:COUNT|SUM|AVG|MIN|MAX|GROUP_CONCAT|STRING_AGG|ARRAY_AGG|LISTAGG|STDDEV|VARIANCE|BIT_AND|BIT_OR|BOOL_AND|BOOL_OR|EVERY)\s*\("
    )
    .expect("valid regex")
});

/// Whether the statement's first word is `keyword`.
fn starts_with_keyword(statement: &Statement, keyword: &str) -> bool {
    statement
        .masked
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .find(|word| !word.is_empty())
        .is_some_and(|word| word.eq_ignore_ascii_case(keyword))
}

fn statement_finding(info: &RuleInfo, statement: &Statement) -> Finding {
    Finding::new(info, statement.line, statement.index).column(statement.column)
}

/// UPDATE without WHERE affects all rows
pub struct MissingWhereInUpdate;

impl Rule for MissingWhereInUpdate {
    fn info(&self) -> RuleInfo {
        info("SEM001", "UPDATE without WHERE", "missing_where", Severity::High)
    }

    fn check(&self, statement: &Statement, _ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        if !starts_with_keyword(statement, "UPDATE") || WHERE.is_match(&statement.masked) {
            return vec![];
        }
        vec![
            statement_finding(&self.info(), statement)
                .message("UPDATE statement without WHERE clause affects all rows")
                .suggestion("Add WHERE clause to limit affected rows"),
        ]
    }
}

/// DELETE without WHERE affects all rows
pub struct MissingWhereInDelete;

impl Rule for MissingWhereInDelete {
    fn info(&self) -> RuleInfo {
        info("SEM002", "DELETE without WHERE", "missing_where", Severity::High)
    }

    fn check(&self, statement: &Statement, _ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        if !starts_with_keyword(statement, "DELETE") || WHERE.is_match(&statement.masked) {
            return vec![];
        }
        vec![
            statement_finding(&self.info(), statement)
                .message("DELETE statement without WHERE clause affects all rows")
                .suggestion("Add WHERE clause to limit deleted rows"),
        ]
    }
}

/// GROUP BY with nothing to aggregate is a disguised DISTINCT
pub struct GroupByWithoutAggregate;

impl Rule for GroupByWithoutAggregate {
    fn info(&self) -> RuleInfo {
        info(
            "SEM003",
            "GROUP BY without aggregate",
            "group_by_without_aggregate",
            Severity::Medium
        )
    }

    fn check(&self, statement: &Statement, _ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let Some(m) = GROUP_BY.find(&statement.masked) else {
            return vec![];
        };
        if AGGREGATE.is_match(&statement.masked) {
            return vec![];
        }
        let (line, column) = statement.position(m.start());
        vec![
            Finding::new(&self.info(), line, statement.index)
                .column(column)
                .message("GROUP BY used without any aggregate function")
                .suggestion("Use SELECT DISTINCT, or add the aggregate the grouping is meant for"),
        ]
    }
}

/// HAVING filters groups and needs a GROUP BY
pub struct HavingWithoutGroupBy;

impl Rule for HavingWithoutGroupBy {
    fn info(&self) -> RuleInfo {
        info(
            "SEM004",
            "HAVING without GROUP BY",
            "having_without_group_by",
            Severity::High
        )
    }

    fn check(&self, statement: &Statement, _ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let Some(m) = HAVING.find(&statement.masked) else {
            return vec![];
        };
        if GROUP_BY.is_match(&statement.masked) {
            return vec![];
        }
        let (line, column) = statement.position(m.start());
        vec![
            Finding::new(&self.info(), line, statement.index)
                .column(column)
                .message("HAVING clause used without GROUP BY")
                .suggestion("Move the condition to WHERE, or add the missing GROUP BY"),
        ]
    }
}
