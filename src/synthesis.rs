//! Scoring and correction synthesis.
//!
//! The synthesizer is the join point of an analysis: it receives the output
//! of every pass and builds the immutable [`AnalysisResult`].
//!
//! # Scoring
//!
//! Each finding deducts points from the score of its own category:
//!
//! | Severity | Deduction | Light categories |
//! |----------|-----------|------------------|
//! | critical | 25        | 25               |
//! | high     | 15        | 15               |
//! | medium   | 10        | 8                |
//! | low      | 5         | 3                |
//!
//! Light categories are `select_star`, `missing_limit`,
//! `missing_terminator`, `union_without_all` and `or_chain`. Index
//! suggestions are informational and deduct nothing. Category scores are
//! floored at 0 and combined into the quality score with weights syntax 25%,
//! semantic 20%, security 25%, performance 20%, schema 10%.
//!
//! # Correction
//!
//! Fixes are applied to a working copy of the document, first occurrence
//! only, then comment lines are inserted above their target lines in
//! descending line order.

use std::{collections::BTreeMap, sync::LazyLock};

use indexmap::IndexSet;
use regex::Regex;
use serde::Serialize;

use crate::{
    document::{Dialect, SourceDocument},
    rules::{Finding, Severity},
    schema::{Relationship, SchemaExtraction, TableModel},
    segment::{Statement, code_line_starts}
};

/// Per-category scores feeding the weighted quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryScores {
    pub syntax:      u32,
    pub semantic:    u32,
    pub security:    u32,
    pub performance: u32,
    pub schema:      u32
}

impl Default for CategoryScores {
    fn default() -> Self {
        Self {
            syntax:      100,
            semantic:    100,
            security:    100,
            performance: 100,
            schema:      100
        }
    }
}

impl CategoryScores {
    /// Weighted average, rounded.
    pub fn quality(&self) -> u32 {
        let weighted = 0.25 * f64::from(self.syntax)
            + 0.20 * f64::from(self.semantic)
            + 0.25 * f64::from(self.security)
            + 0.20 * f64::from(self.performance)
            + 0.10 * f64::from(self.schema);
        weighted.round() as u32
    }
}

/// Explanatory comment attached to a document line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    /// 1-based line the comment is placed above
    pub line: usize,
    pub text: String
}

/// Findings of all four passes, one list per output category.
#[derive(Debug, Clone, Default)]
pub struct PassOutputs {
    pub syntax:      Vec<Finding>,
    pub semantic:    Vec<Finding>,
    pub performance: Vec<Finding>,
    pub security:    Vec<Finding>,
    pub schema:      SchemaExtraction
}

/// Complete, immutable result of analyzing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    /// Hex SHA-256 of the analyzed text
    pub content_hash:             String,
    pub database_type:            Dialect,
    pub total_lines:              usize,
    pub total_statements:         usize,
    pub syntax_errors:            Vec<Finding>,
    pub semantic_errors:          Vec<Finding>,
    pub performance_issues:       Vec<Finding>,
    pub security_vulnerabilities: Vec<Finding>,
    pub schema_findings:          Vec<Finding>,
    pub tables:                   Vec<TableModel>,
    pub relationships:            Vec<Relationship>,
    pub category_scores:          CategoryScores,
    pub quality_score:            u32,
    pub complexity_score:         u32,
    /// Deduplicated advice derived from the finding categories present
    pub recommendations:          Vec<String>,
    /// Document with fixes applied and comments inserted
    pub corrected_sql:            String,
    pub intelligent_comments:     Vec<Comment>
}

impl AnalysisResult {
    /// All findings in output order: syntax, semantic, performance,
    /// security, schema.
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.syntax_errors
            .iter()
            .chain(&self.semantic_errors)
            .chain(&self.performance_issues)
            .chain(&self.security_vulnerabilities)
            .chain(&self.schema_findings)
    }

    pub fn finding_count(&self) -> usize {
        self.findings().count()
    }

    /// Highest severity among all findings.
    pub fn max_severity(&self) -> Option<Severity> {
        self.findings().map(|f| f.severity).max()
    }
}

/// Categories whose findings deduct the reduced amount.
const LIGHT_CATEGORIES: &[&str] = &[
    "select_star",
    "missing_limit",
    "missing_terminator",
    "union_without_all",
    "or_chain"
];

/// Points one finding deducts from its category score.
pub fn deduction(finding: &Finding) -> u32 {
    if finding.category == "index_suggestion" {
        return 0;
    }
    let light = LIGHT_CATEGORIES.contains(&finding.category);
    match (finding.severity, light) {
        (Severity::Critical, _) => 25,
        (Severity::High, _) => 15,
        (Severity::Medium, false) => 10,
        (Severity::Medium, true) => 8,
        (Severity::Low, false) => 5,
        (Severity::Low, true) => 3
    }
}

/// 100 minus all deductions, floored at 0.
pub fn category_score(findings: &[Finding]) -> u32 {
    let total: u32 = findings.iter().map(deduction).sum();
    100u32.saturating_sub(total)
}

static COMPLEXITY_TERMS: LazyLock<Vec<(Regex, u32)>> = LazyLock::new(|| {
    [
        (r"\bJOIN\b", 15),
        (r"\bCASE\b", 10),
        (r"\bWHERE\b", 10),
        (r"\bHAVING\b", 15),
        (r"\bGROUP\s+BY\b", 10),
        (r"\bORDER\s+BY\b", 5)
    ]
    .into_iter()
    .map(|(pattern, weight)| {
        let regex = Regex::new(&format!("(?i){}", pattern)).expect("valid regex");
        (regex, weight)
    })
    .collect()
});

static SELECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bSELECT\b").expect("valid regex"));

/// Structural complexity of one statement, capped at 100.
pub fn statement_complexity(statement: &Statement) -> u32 {
    let masked = &statement.masked;
    let count = |re: &Regex| re.find_iter(masked).count() as u32;
    let nested = count(&SELECT).saturating_sub(1);
    let terms: u32 = COMPLEXITY_TERMS
        .iter()
        .map(|(re, weight)| count(re) * weight)
        .sum();
    (10 + nested * 10 + terms).min(100)
}

/// Average statement complexity, rounded; 0 without statements.
pub fn complexity_score(statements: &[Statement]) -> u32 {
    if statements.is_empty() {
        return 0;
    }
    let total: u32 = statements.iter().map(statement_complexity).sum();
    (f64::from(total) / statements.len() as f64).round() as u32
}

/// Advice per finding category; unknown categories fall back to the
/// finding's own suggestion.
const RECOMMENDATIONS: &[(&str, &str)] = &[
    ("unbalanced_parentheses", "Check that every opening parenthesis is closed"),
    ("missing_from", "Add FROM clauses to SELECT statements that read tables"),
    ("missing_terminator", "Terminate every statement with a semicolon"),
    ("unknown_keyword", "Fix misspelled SQL keywords"),
    ("missing_where", "Always restrict UPDATE and DELETE statements with a WHERE clause"),
    (
        "group_by_without_aggregate",
        "Use SELECT DISTINCT instead of GROUP BY when nothing is aggregated"
    ),
    ("having_without_group_by", "Filter ungrouped rows with WHERE instead of HAVING"),
    ("select_star", "Replace SELECT * with explicit column lists"),
    ("leading_wildcard", "Avoid LIKE patterns that start with a wildcard"),
    ("missing_limit", "Limit sorted result sets to the rows actually needed"),
    ("index_suggestion", "Add indexes on columns used in equality filters"),
    ("or_chain", "Replace chains of OR conditions with IN lists"),
    ("large_offset", "Use keyset pagination instead of large OFFSET values"),
    ("not_in_subquery", "Use NOT EXISTS instead of NOT IN with subqueries"),
    ("union_without_all", "Prefer UNION ALL when duplicate removal is not required"),
    ("function_on_column", "Keep indexed columns bare in WHERE conditions"),
    ("sql_injection", "Use parameterized queries to prevent SQL injection"),
    ("dangerous_function", "Remove file and command execution functions from SQL"),
    ("privilege_escalation", "Apply the principle of least privilege to database accounts"),
    ("hardcoded_credentials", "Move credentials out of SQL into a secret store"),
    ("information_disclosure", "Restrict application access to system catalogs"),
    ("destructive_operation", "Run destructive DDL only through reviewed migrations with backups"),
    ("missing_primary_key", "Give every table a primary key"),
    ("undeclared_reference", "Declare referenced tables alongside their foreign keys"),
    ("analyzer_fault", "Part of the analysis failed; review the affected category manually")
];

/// Deduplicated recommendations in first-seen order.
pub fn recommendations<'a>(findings: impl IntoIterator<Item = &'a Finding>) -> Vec<String> {
    let mut seen: IndexSet<String> = IndexSet::new();
    for finding in findings {
        let advice = RECOMMENDATIONS
            .iter()
            .find(|(category, _)| *category == finding.category)
            .map(|(_, advice)| (*advice).to_string())
            .unwrap_or_else(|| finding.suggestion.clone());
        if !advice.is_empty() {
            seen.insert(advice);
        }
    }
    seen.into_iter().collect()
}

/// Byte offset of the start of 1-based `line`.
fn line_start(text: &str, line: usize) -> usize {
    if line <= 1 {
        return 0;
    }
    text.match_indices('\n')
        .nth(line - 2)
        .map(|(i, _)| i + 1)
        .unwrap_or(text.len())
}

/// Apply every fix to a copy of `text`.
///
/// Fixes are applied from the end of the document backwards so that each
/// anchor still points at the original position. A fix whose fragment no
/// longer occurs is skipped.
pub fn apply_fixes<'a>(text: &str, findings: impl IntoIterator<Item = &'a Finding>) -> String {
    let mut fixes: Vec<(usize, &Finding)> = findings
        .into_iter()
        .filter(|f| f.fix.is_some())
        .map(|f| {
            let from = f
                .fix
                .as_ref()
                .and_then(|fix| fix.anchor)
                .unwrap_or_else(|| line_start(text, f.line));
            (from, f)
        })
        .collect();
    fixes.sort_by(|a, b| b.0.cmp(&a.0));

    let mut corrected = text.to_string();
    for (from, finding) in fixes {
        if let Some(fix) = &finding.fix
            && let Some(next) = fix.apply(&corrected, from)
        {
            corrected = next;
        }
    }
    corrected
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Comments for notable findings and extracted tables, ordered by line.
///
/// A finding gets a comment when it is at least medium severity or carries
/// a fix.
pub fn comments<'a>(
    findings: impl IntoIterator<Item = &'a Finding>,
    tables: &[TableModel]
) -> Vec<Comment> {
    let mut comments: Vec<Comment> = findings
        .into_iter()
        .filter(|f| f.severity >= Severity::Medium || f.fix.is_some())
        .map(|f| {
            let mut text = format!("-- [{}] {}", f.severity, single_line(&f.message));
            if !f.suggestion.is_empty() {
                text.push_str(". Suggestion: ");
                text.push_str(&single_line(&f.suggestion));
            }
            Comment {
                line: f.line,
                text
            }
        })
        .collect();

    for table in tables {
        let mut text = format!(
            "-- Table {}: {} column(s)",
            table.name,
            table.columns.len()
        );
        if !table.primary_key.is_empty() {
            let keys: Vec<&str> = table.primary_key.iter().map(|k| k.as_str()).collect();
            text.push_str(&format!(", primary key ({})", keys.join(", ")));
        }
        if !table.foreign_keys.is_empty() {
            text.push_str(&format!(", {} foreign key(s)", table.foreign_keys.len()));
        }
        comments.push(Comment {
            line: table.line,
            text: single_line(&text)
        });
    }

    comments.sort_by_key(|c| c.line);
    comments
}

/// Insert comment lines above their target lines.
///
/// A target line that starts inside a quoted literal or block comment is
/// moved up to the nearest line starting in code, which for a multi-line
/// literal is the line that opens it. Lines are processed in descending
/// order so earlier insertions never shift the positions of later ones.
/// Inserted lines copy the target line's indentation.
pub fn insert_comments(text: &str, comments: &[Comment]) -> String {
    if comments.is_empty() {
        return text.to_string();
    }
    let code_starts = code_line_starts(text);
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    let mut by_line: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for comment in comments {
        let mut line = comment.line.clamp(1, lines.len());
        while line > 1 && !code_starts.get(line - 1).copied().unwrap_or(true) {
            line -= 1;
        }
        by_line.entry(line).or_default().push(&comment.text);
    }
    for (&line, texts) in by_line.iter().rev() {
        let index = line - 1;
        let target = &lines[index];
        let indent = &target[..target.len() - target.trim_start().len()];
        let inserted: Vec<String> = texts
            .iter()
            .map(|text| format!("{}{}", indent, text))
            .collect();
        lines.splice(index..index, inserted);
    }
    lines.join("\n")
}

/// Keep every finding line within `[1, line_count]`.
fn clamp_lines(findings: &mut [Finding], line_count: usize) {
    let last = line_count.max(1);
    for finding in findings {
        finding.line = finding.line.clamp(1, last);
    }
}

/// Build the final result from the pass outputs.
pub fn synthesize(
    document: &SourceDocument,
    statements: &[Statement],
    mut passes: PassOutputs
) -> AnalysisResult {
    let line_count = document.line_count();
    for list in [
        &mut passes.syntax,
        &mut passes.semantic,
        &mut passes.performance,
        &mut passes.security,
        &mut passes.schema.findings
    ] {
        clamp_lines(list, line_count);
    }

    let category_scores = CategoryScores {
        syntax:      category_score(&passes.syntax),
        semantic:    category_score(&passes.semantic),
        security:    category_score(&passes.security),
        performance: category_score(&passes.performance),
        schema:      category_score(&passes.schema.findings)
    };

    let all = || {
        passes
            .syntax
            .iter()
            .chain(&passes.semantic)
            .chain(&passes.performance)
            .chain(&passes.security)
            .chain(&passes.schema.findings)
    };
    let recommendations = recommendations(all());
    let intelligent_comments = comments(all(), &passes.schema.tables);
    let fixed = apply_fixes(document.text(), all());
    let corrected_sql = insert_comments(&fixed, &intelligent_comments);

    AnalysisResult {
        content_hash: document.content_hash().to_string(),
        database_type: document.dialect(),
        total_lines: line_count,
        total_statements: statements.len(),
        quality_score: category_scores.quality(),
        complexity_score: complexity_score(statements),
        category_scores,
        recommendations,
        corrected_sql,
        intelligent_comments,
        syntax_errors: passes.syntax,
        semantic_errors: passes.semantic,
        performance_issues: passes.performance,
        security_vulnerabilities: passes.security,
        tables: passes.schema.tables,
        relationships: passes.schema.relationships,
        schema_findings: passes.schema.findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_start() {
        let text = "a\nbb\nccc";
        assert_eq!(line_start(text, 1), 0);
        assert_eq!(line_start(text, 2), 2);
        assert_eq!(line_start(text, 3), 5);
        assert_eq!(line_start(text, 9), text.len());
    }

    #[test]
    fn test_insert_comments_keeps_indentation() {
        let comments = vec![
            Comment {
                line: 2,
                text: "-- second".to_string()
            },
            Comment {
                line: 1,
                text: "-- first".to_string()
            },
        ];
        let out = insert_comments("SELECT 1;\n  SELECT 2;", &comments);
        assert_eq!(out, "-- first\nSELECT 1;\n  -- second\n  SELECT 2;");
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("a\n  b\r\nc"), "a b c");
    }
}
