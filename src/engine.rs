//! Analysis orchestration.
//!
//! [`Engine`] owns the rule runners for every pass and a shared
//! [`AnalysisCache`]. One analysis runs as follows:
//!
//! ```text
//!                    ┌──────────┐
//!   text ──────────▶ │ segment  │
//!                    └────┬─────┘
//!        ┌────────────┬───┴────────┬────────────┐
//!        ▼            ▼            ▼            ▼
//!    syntax   semantic/perf    security      schema      (parallel)
//!        └────────────┴─────┬──────┴────────────┘
//!                           ▼
//!                      synthesize ──▶ Arc<AnalysisResult>
//! ```
//!
//! Each pass runs behind a panic boundary. A pass that panics yields one
//! critical `INTERNAL` finding in its own category and the other passes
//! complete normally, so an analysis always returns a result.
//!
//! # Example
//!
//! ```
//! use sql_lens::{config::Config, engine::Engine};
//!
//! let engine = Engine::new(&Config::default());
//! let result = engine.analyze("UPDATE accounts SET balance = 0;", None);
//!
//! assert_eq!(result.semantic_errors.len(), 1);
//! assert!(result.quality_score < 100);
//!
//! let again = engine.analyze("UPDATE accounts SET balance = 0;", None);
//! assert!(std::sync::Arc::ptr_eq(&result, &again));
//! ```

use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Instant
};

use tracing::{debug, info, warn};

use crate::{
    cache::{AnalysisCache, CacheKey},
    config::{Config, RulesConfig},
    document::{Dialect, SourceDocument},
    error::PassFault,
    rules::{
        AnalysisContext, Classification, Finding, FindingKind, RuleInfo, RuleRunner, Severity,
        performance, security, semantic, syntax
    },
    schema::{self, SchemaExtraction},
    segment::{Statement, segment},
    synthesis::{AnalysisResult, PassOutputs, synthesize}
};

/// Run `pass` behind a panic boundary.
fn isolate<T>(name: &'static str, pass: impl FnOnce() -> T) -> Result<T, PassFault> {
    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(pass))
        .map_err(|payload| PassFault::from_panic(name, &*payload));
    match &outcome {
        Ok(_) => debug!(
            pass = name,
            elapsed_us = started.elapsed().as_micros() as u64,
            "pass finished"
        ),
        Err(fault) => warn!(pass = name, reason = %fault.reason, "pass faulted")
    }
    outcome
}

/// Synthetic finding standing in for a pass that faulted.
pub fn fault_finding(kind: FindingKind, fault: &PassFault) -> Finding {
    let info = RuleInfo {
        id: "INTERNAL",
        name: "Analyzer fault",
        kind,
        category: "analyzer_fault",
        severity: Severity::Critical,
        classification: Classification::NONE
    };
    Finding::new(&info, 1, 0)
        .message(fault.to_string())
        .suggestion("Review this category manually; the other categories were analyzed")
}

/// SQL text analysis engine.
///
/// Rule tables are compiled once in [`Engine::new`]. The engine is `Sync`
/// and may analyze many documents concurrently.
pub struct Engine {
    default_dialect: Option<Dialect>,
    rules_config:    RulesConfig,
    syntax:          RuleRunner,
    checks:          RuleRunner,
    security:        RuleRunner,
    cache:           Arc<AnalysisCache>
}

impl Engine {
    /// Build an engine with a private cache configured from `config`.
    pub fn new(config: &Config) -> Self {
        let cache = Arc::new(AnalysisCache::new(config.cache.ttl()));
        Self::with_cache(config, cache)
    }

    /// Build an engine that shares an existing cache.
    pub fn with_cache(config: &Config, cache: Arc<AnalysisCache>) -> Self {
        let mut checks = semantic::rules();
        checks.extend(performance::rules());
        Self {
            default_dialect: config.analysis.dialect,
            rules_config: config.rules.clone(),
            syntax: RuleRunner::with_config(syntax::rules(), &config.rules),
            checks: RuleRunner::with_config(checks, &config.rules),
            security: RuleRunner::with_config(security::rules(), &config.rules),
            cache
        }
    }

    pub fn cache(&self) -> &Arc<AnalysisCache> {
        &self.cache
    }

    /// Analyze `text`, serving byte-identical input from the cache.
    ///
    /// Without a dialect hint the configured default is used, and without
    /// that the dialect is detected from the text.
    pub fn analyze(&self, text: &str, dialect: Option<Dialect>) -> Arc<AnalysisResult> {
        let declared = dialect.or(self.default_dialect);
        let document = SourceDocument::new(text, declared);
        let key = CacheKey::new(document.content_hash(), declared);
        self.cache
            .get_or_compute(key, || self.analyze_document(&document))
    }

    /// Analyze a document without consulting the cache.
    pub fn analyze_document(&self, document: &SourceDocument) -> AnalysisResult {
        let started = Instant::now();
        let statements = segment(document.text());
        let ctx = AnalysisContext {
            dialect:    document.dialect(),
            statements: &statements
        };

        let ((syntax, checks), (security, schema)) = rayon::join(
            || {
                rayon::join(
                    || self.run_pass("syntax", FindingKind::Syntax, &self.syntax, &ctx),
                    || self.run_pass("semantic", FindingKind::Semantic, &self.checks, &ctx)
                )
            },
            || {
                rayon::join(
                    || self.run_pass("security", FindingKind::Security, &self.security, &ctx),
                    || self.run_schema(&statements)
                )
            }
        );

        let (semantic, performance): (Vec<Finding>, Vec<Finding>) = checks
            .into_iter()
            .partition(|f| f.kind != FindingKind::Performance);

        let result = synthesize(
            document,
            &statements,
            PassOutputs {
                syntax,
                semantic,
                performance,
                security,
                schema
            }
        );

        info!(
            hash = &result.content_hash[..12],
            dialect = %result.database_type,
            statements = result.total_statements,
            findings = result.finding_count(),
            quality = result.quality_score,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis complete"
        );
        result
    }

    fn run_pass(
        &self,
        name: &'static str,
        kind: FindingKind,
        runner: &RuleRunner,
        ctx: &AnalysisContext<'_>
    ) -> Vec<Finding> {
        match isolate(name, || runner.run(ctx)) {
            Ok(findings) => {
                debug!(pass = name, rules = runner.len(), findings = findings.len());
                findings
            }
            Err(fault) => vec![fault_finding(kind, &fault)]
        }
    }

    fn run_schema(&self, statements: &[Statement]) -> SchemaExtraction {
        match isolate("schema", || schema::extract(statements, &self.rules_config)) {
            Ok(extraction) => {
                debug!(
                    pass = "schema",
                    tables = extraction.tables.len(),
                    findings = extraction.findings.len()
                );
                extraction
            }
            Err(fault) => SchemaExtraction {
                findings: vec![fault_finding(FindingKind::Schema, &fault)],
                ..SchemaExtraction::default()
            }
        }
    }
}
