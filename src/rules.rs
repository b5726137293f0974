//! Shared rule engine.
//!
//! Every analyzer pass owns an ordered list of rules and hands it to a
//! [`RuleRunner`]. A rule is either a structural check implemented in code
//! or a declarative [`PatternRule`] record (regular expression plus finding
//! descriptor). Both implement the [`Rule`] trait.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │ Statements  │────▶│  RuleRunner  │────▶│  Findings   │
//! └─────────────┘     └──────────────┘     └─────────────┘
//!                            │
//!                     ┌──────┴──────┐
//!                     │   Rules     │
//!                     │ (in order)  │
//!                     └─────────────┘
//! ```
//!
//! Statements are checked in parallel with [`rayon`]; findings come back in
//! statement order and, within a statement, in rule order. Rules are not
//! mutually exclusive: one statement may trigger any number of them.
//!
//! # Rule Families
//!
//! - **Syntax** (`SYN001`-`SYN004`) - Structural defects
//! - **Semantic** (`SEM001`-`SEM004`) - Dangerous or meaningless constructs
//! - **Performance** (`PERF001`-`PERF009`) - Query anti-patterns
//! - **Security** (`SEC001`-`SEC023`) - Injection, privileges, credentials
//!
//! # Configuration
//!
//! ```toml
//! [rules]
//! disabled = ["PERF007"]
//!
//! [rules.severity]
//! PERF001 = "high"
//! ```

pub mod performance;
pub mod security;
pub mod semantic;
pub mod syntax;
mod types;

use std::collections::HashMap;

use rayon::prelude::*;
use regex::{Regex, RegexBuilder};
pub use types::{Classification, Finding, FindingKind, Fix, RuleInfo, Severity};

use crate::{config::RulesConfig, document::Dialect, segment::Statement};

/// Read-only data shared by all rules of one analysis.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub dialect:    Dialect,
    pub statements: &'a [Statement]
}

/// Trait for implementing SQL analysis rules.
///
/// Rules are stateless: they examine one statement and return any findings.
/// They must be `Send + Sync` for parallel execution.
pub trait Rule: Send + Sync {
    /// Returns metadata about this rule.
    fn info(&self) -> RuleInfo;

    /// Checks a statement and returns findings, empty if it passes.
    fn check(&self, statement: &Statement, ctx: &AnalysisContext<'_>) -> Vec<Finding>;
}

/// What a [`PatternRule`] is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchScope {
    /// Each line of the statement, literals intact; one finding per line
    Line,
    /// The whole statement, literals intact; first match only
    Statement,
    /// The whole statement with literal contents blanked; first match only
    Masked
}

/// Declarative rule record: pattern to finding descriptor.
///
/// `message` and `suggestion` may contain `{match}`, replaced by the matched
/// text.
#[derive(Debug, Clone, Copy)]
pub struct PatternRule {
    pub info:        RuleInfo,
    pub pattern:     &'static str,
    pub scope:       MatchScope,
    pub message:     &'static str,
    pub suggestion:  &'static str,
    pub improvement: Option<&'static str>
}

impl PatternRule {
    /// Compile into an executable rule. Matching is case-insensitive.
    ///
    /// # Panics
    ///
    /// Panics if `pattern` is not a valid regular expression. Rule tables
    /// are static, so this fails on first use in tests.
    pub fn compile(self) -> CompiledPattern {
        let regex = RegexBuilder::new(self.pattern)
            .case_insensitive(true)
            .build()
            .expect("valid rule pattern");
        CompiledPattern {
            rule: self,
            regex
        }
    }
}

/// A [`PatternRule`] with its compiled regular expression.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    rule:  PatternRule,
    regex: Regex
}

impl CompiledPattern {
    fn finding(
        &self,
        statement: &Statement,
        matched: &str,
        line: usize,
        column: usize
    ) -> Finding {
        let shown = abbreviate(matched.trim());
        let mut finding = Finding::new(&self.rule.info, line, statement.index)
            .column(column)
            .message(self.rule.message.replace("{match}", &shown))
            .suggestion(self.rule.suggestion.replace("{match}", &shown));
        if let Some(estimate) = self.rule.improvement {
            finding = finding.improvement(estimate);
        }
        finding
    }
}

impl Rule for CompiledPattern {
    fn info(&self) -> RuleInfo {
        self.rule.info
    }

    fn check(&self, statement: &Statement, _ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        match self.rule.scope {
            MatchScope::Line => statement
                .lines()
                .filter_map(|(line, text)| {
                    self.regex.find(text).map(|m| {
                        let column = text[..m.start()].chars().count() + 1;
                        self.finding(statement, m.as_str(), line, column)
                    })
                })
                .collect(),
            MatchScope::Statement | MatchScope::Masked => {
                let haystack = if self.rule.scope == MatchScope::Masked {
                    &statement.masked
                } else {
                    &statement.text
                };
                match self.regex.find(haystack) {
                    Some(m) => {
                        let (line, column) = statement.position(m.start());
                        let matched = statement.text.get(m.range()).unwrap_or(m.as_str());
                        vec![self.finding(statement, matched, line, column)]
                    }
                    None => vec![]
                }
            }
        }
    }
}

fn abbreviate(text: &str) -> String {
    const LIMIT: usize = 60;
    if text.chars().count() <= LIMIT {
        text.to_string()
    } else {
        let head: String = text.chars().take(LIMIT).collect();
        format!("{}...", head)
    }
}

/// Ordered rule list with configuration applied.
///
/// The runner filters out disabled rules and applies severity overrides to
/// every finding it returns.
pub struct RuleRunner {
    rules:          Vec<Box<dyn Rule>>,
    severity_cache: HashMap<&'static str, Severity>
}

impl RuleRunner {
    /// Build a runner from a rule list and configuration.
    pub fn with_config(all_rules: Vec<Box<dyn Rule>>, config: &RulesConfig) -> Self {
        let rules: Vec<Box<dyn Rule>> = all_rules
            .into_iter()
            .filter(|r| !config.is_disabled(r.info().id))
            .collect();
        let mut severity_cache = HashMap::new();
        for rule in &rules {
            let rule_id = rule.info().id;
            if let Some(sev) = config.severity_for(rule_id) {
                severity_cache.insert(rule_id, sev);
            }
        }
        Self {
            rules,
            severity_cache
        }
    }

    /// Number of enabled rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run all rules over every statement (parallel over statements).
    pub fn run(&self, ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let per_statement: Vec<Vec<Finding>> = ctx
            .statements
            .par_iter()
            .map(|statement| {
                self.rules
                    .iter()
                    .flat_map(|rule| rule.check(statement, ctx))
                    .collect()
            })
            .collect();
        let mut findings: Vec<Finding> = per_statement.into_iter().flatten().collect();
        for finding in &mut findings {
            if let Some(&severity) = self.severity_cache.get(finding.rule_id) {
                finding.severity = severity;
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::segment;

    const PROBE: PatternRule = PatternRule {
        info:        RuleInfo {
            id:             "TEST001",
            name:           "Probe",
            kind:           FindingKind::Security,
            category:       "probe",
            severity:       Severity::Medium,
            classification: Classification::NONE
        },
        pattern:     r"\bprobe\b",
        scope:       MatchScope::Line,
        message:     "Found {match}",
        suggestion:  "Remove {match}",
        improvement: None
    };

    #[test]
    fn test_line_scope_reports_each_line() {
        let statements = segment("SELECT probe,\n  PROBE FROM t;");
        let ctx = AnalysisContext {
            dialect:    Dialect::Generic,
            statements: &statements
        };
        let findings = PROBE.compile().check(&statements[0], &ctx);
        assert_eq!(findings.len(), 2);
        assert_eq!((findings[0].line, findings[0].column), (1, Some(8)));
        assert_eq!((findings[1].line, findings[1].column), (2, Some(3)));
        assert_eq!(findings[1].message, "Found PROBE");
    }

    #[test]
    fn test_masked_scope_ignores_literals() {
        let rule = PatternRule {
            scope: MatchScope::Masked,
            ..PROBE
        }
        .compile();
        let statements = segment("SELECT 'probe' FROM t;");
        let ctx = AnalysisContext {
            dialect:    Dialect::Generic,
            statements: &statements
        };
        assert!(rule.check(&statements[0], &ctx).is_empty());
    }

    #[test]
    fn test_runner_applies_config() {
        let statements = segment("SELECT probe FROM t;");
        let ctx = AnalysisContext {
            dialect:    Dialect::Generic,
            statements: &statements
        };
        let mut config = RulesConfig::default();
        config
            .severity
            .insert("TEST001".to_string(), "critical".to_string());
        let runner = RuleRunner::with_config(vec![Box::new(PROBE.compile())], &config);
        let findings = runner.run(&ctx);
        assert_eq!(findings[0].severity, Severity::Critical);

        config.disabled.push("test001".to_string());
        let runner = RuleRunner::with_config(vec![Box::new(PROBE.compile())], &config);
        assert!(runner.is_empty());
        assert!(runner.run(&ctx).is_empty());
    }
}
