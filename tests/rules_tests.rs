// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use sql_lens::{
    config::RulesConfig,
    document::Dialect,
    rules::{
        AnalysisContext, Finding, FindingKind, Rule, RuleRunner, Severity, performance, semantic,
        syntax
    },
    segment::segment
};

fn run_with(rules: Vec<Box<dyn Rule>>, sql: &str, dialect: Dialect) -> Vec<Finding> {
    let statements = segment(sql);
    let ctx = AnalysisContext {
        dialect,
        statements: &statements
    };
    RuleRunner::with_config(rules, &RulesConfig::default()).run(&ctx)
}

fn run(rules: Vec<Box<dyn Rule>>, sql: &str) -> Vec<Finding> {
    run_with(rules, sql, Dialect::Generic)
}

fn ids(findings: &[Finding]) -> Vec<&'static str> {
    findings.iter().map(|f| f.rule_id).collect()
}

fn find<'a>(findings: &'a [Finding], id: &str) -> Option<&'a Finding> {
    findings.iter().find(|f| f.rule_id == id)
}

// Syntax

#[test]
fn test_unclosed_parenthesis() {
    let findings = run(syntax::rules(), "SELECT (a + b FROM t;");
    let f = find(&findings, "SYN001").unwrap();
    assert_eq!(f.severity, Severity::High);
    assert_eq!(f.kind, FindingKind::Syntax);
    assert_eq!(f.category, "unbalanced_parentheses");
    assert_eq!((f.line, f.column), (1, Some(8)));
    assert!(f.message.contains("1 opening, 0 closing"));
}

#[test]
fn test_stray_closing_parenthesis() {
    let findings = run(syntax::rules(), "SELECT a) FROM t;");
    assert!(ids(&findings).contains(&"SYN001"));
}

#[test]
fn test_parentheses_in_literals_ignored() {
    let findings = run(syntax::rules(), "SELECT id FROM t WHERE note = ':-(';");
    assert!(!ids(&findings).contains(&"SYN001"));
}

#[test]
fn test_select_without_from() {
    let findings = run(syntax::rules(), "SELECT name, email;");
    let f = find(&findings, "SYN002").unwrap();
    assert_eq!(f.category, "missing_from");
    assert_eq!(f.line, 1);
}

#[test]
fn test_constant_select_needs_no_from() {
    for sql in ["SELECT 1;", "SELECT NOW();", "SELECT 'x' AS label;", "SELECT @@version;"] {
        let findings = run(syntax::rules(), sql);
        assert!(!ids(&findings).contains(&"SYN002"), "{}", sql);
    }
}

#[test]
fn test_oracle_constant_select_needs_dual() {
    let findings = run_with(syntax::rules(), "SELECT 1;", Dialect::Oracle);
    let f = find(&findings, "SYN002").unwrap();
    assert!(f.suggestion.contains("DUAL"));
}

#[test]
fn test_missing_terminator_on_last_statement() {
    let findings = run(syntax::rules(), "SELECT 1;\nSELECT 2");
    let missing: Vec<_> = findings.iter().filter(|f| f.rule_id == "SYN003").collect();
    assert_eq!(missing.len(), 1);
    let f = missing[0];
    assert_eq!(f.severity, Severity::Low);
    assert_eq!(f.line, 2);
    let fix = f.fix.as_ref().unwrap();
    assert_eq!(fix.original, "2");
    assert_eq!(fix.replacement, "2;");
    assert_eq!(fix.anchor, Some(17));
}

#[test]
fn test_terminated_document_has_no_terminator_finding() {
    let findings = run(syntax::rules(), "SELECT 1;\nSELECT 2;\n");
    assert!(!ids(&findings).contains(&"SYN003"));
}

#[test]
fn test_misspelled_keyword() {
    let findings = run(syntax::rules(), "SELCT id FROM users;");
    let f = find(&findings, "SYN004").unwrap();
    assert_eq!(f.message, "Unknown keyword 'SELCT'");
    assert_eq!(f.suggestion, "Did you mean 'SELECT'?");
    let fix = f.fix.as_ref().unwrap();
    assert_eq!((fix.original.as_str(), fix.replacement.as_str()), ("SELCT", "SELECT"));
    assert_eq!(fix.anchor, Some(0));
}

#[test]
fn test_misspelled_where_on_later_line() {
    let findings = run(syntax::rules(), "SELECT id\nFROM users\nWHRE id = 1;");
    let f = find(&findings, "SYN004").unwrap();
    assert_eq!((f.line, f.column), (3, Some(1)));
    assert_eq!(f.fix.as_ref().unwrap().replacement, "WHERE");
}

#[test]
fn test_transposed_from_is_flagged() {
    let findings = run(syntax::rules(), "SELECT id FORM users;");
    let f = find(&findings, "SYN004").unwrap();
    assert_eq!(f.message, "Unknown keyword 'FORM'");
    let fix = f.fix.as_ref().unwrap();
    assert_eq!((fix.original.as_str(), fix.replacement.as_str()), ("FORM", "FROM"));
    assert_eq!(fix.anchor, Some(10));
}

#[test]
fn test_uppercase_table_name_is_not_a_typo() {
    let findings = run(syntax::rules(), "SELECT id FROM ORDRS;");
    assert!(!ids(&findings).contains(&"SYN004"));
}

#[test]
fn test_keywords_inside_literals_ignored() {
    let findings = run(syntax::rules(), "SELECT id FROM t WHERE note = 'SELCT';");
    assert!(findings.is_empty());
}

#[test]
fn test_dialect_vocabulary_is_known() {
    let findings = run_with(
        syntax::rules(),
        "CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT);",
        Dialect::Sqlite
    );
    assert!(!ids(&findings).contains(&"SYN004"));
}

// Semantic

#[test]
fn test_update_without_where() {
    let findings = run(semantic::rules(), "UPDATE accounts SET balance = 0;");
    let f = find(&findings, "SEM001").unwrap();
    assert_eq!(f.kind, FindingKind::Semantic);
    assert_eq!(f.category, "missing_where");
    assert_eq!(f.severity, Severity::High);
    assert_eq!(f.message, "UPDATE statement without WHERE clause affects all rows");
}

#[test]
fn test_delete_without_where() {
    let findings = run(semantic::rules(), "SELECT 1;\n\nDELETE FROM sessions;");
    let f = find(&findings, "SEM002").unwrap();
    assert_eq!(f.line, 3);
    assert_eq!(f.statement_index, 1);
    assert_eq!(f.message, "DELETE statement without WHERE clause affects all rows");
}

#[test]
fn test_restricted_update_and_delete_pass() {
    let findings = run(
        semantic::rules(),
        "UPDATE t SET a = 1 WHERE id = 2; DELETE FROM t WHERE id = 3;"
    );
    assert!(findings.is_empty());
}

#[test]
fn test_where_inside_literal_does_not_count() {
    let findings = run(semantic::rules(), "UPDATE t SET note = 'WHERE';");
    assert!(ids(&findings).contains(&"SEM001"));
}

#[test]
fn test_group_by_without_aggregate() {
    let findings = run(semantic::rules(), "SELECT city FROM users GROUP BY city;");
    assert_eq!(ids(&findings), vec!["SEM003"]);

    let findings = run(
        semantic::rules(),
        "SELECT city, COUNT(*) FROM users GROUP BY city;"
    );
    assert!(findings.is_empty());
}

#[test]
fn test_having_without_group_by() {
    let findings = run(semantic::rules(), "SELECT COUNT(*) FROM t HAVING COUNT(*) > 1;");
    let f = find(&findings, "SEM004").unwrap();
    assert_eq!(f.severity, Severity::High);
    assert_eq!(f.column, Some(24));
}

// Performance

#[test]
fn test_select_star() {
    let findings = run(performance::rules(), "SELECT * FROM users;");
    let f = find(&findings, "PERF001").unwrap();
    assert_eq!(f.kind, FindingKind::Performance);
    assert_eq!(f.category, "select_star");
    assert_eq!(f.severity, Severity::Medium);
    assert!(f.estimated_improvement.is_some());
}

#[test]
fn test_count_star_is_not_select_star() {
    let findings = run(performance::rules(), "SELECT COUNT(*) FROM users;");
    assert!(!ids(&findings).contains(&"PERF001"));
}

#[test]
fn test_leading_wildcard() {
    let findings = run(
        performance::rules(),
        "SELECT id FROM users WHERE email LIKE '%@example.com';"
    );
    let f = find(&findings, "PERF002").unwrap();
    assert_eq!(f.severity, Severity::High);

    let findings = run(
        performance::rules(),
        "SELECT id FROM users WHERE email LIKE 'admin%';"
    );
    assert!(!ids(&findings).contains(&"PERF002"));
}

#[test]
fn test_order_by_without_limit() {
    let findings = run(performance::rules(), "SELECT id FROM t ORDER BY id;");
    let f = find(&findings, "PERF003").unwrap();
    assert_eq!(f.category, "missing_limit");
    assert!(f.suggestion.contains("LIMIT n"));

    let findings = run(performance::rules(), "SELECT id FROM t ORDER BY id LIMIT 10;");
    assert!(!ids(&findings).contains(&"PERF003"));
}

#[test]
fn test_limit_syntax_follows_dialect() {
    let findings = run_with(
        performance::rules(),
        "SELECT id FROM t ORDER BY id;",
        Dialect::SqlServer
    );
    assert!(find(&findings, "PERF003").unwrap().suggestion.contains("TOP n"));

    let findings = run_with(
        performance::rules(),
        "SELECT TOP 5 id FROM t ORDER BY id;",
        Dialect::SqlServer
    );
    assert!(!ids(&findings).contains(&"PERF003"));

    let findings = run_with(
        performance::rules(),
        "SELECT id FROM t ORDER BY id FETCH FIRST 5 ROWS ONLY;",
        Dialect::Oracle
    );
    assert!(!ids(&findings).contains(&"PERF003"));
}

#[test]
fn test_window_order_by_is_not_a_sort() {
    let findings = run(
        performance::rules(),
        "SELECT ROW_NUMBER() OVER (ORDER BY id) AS rn FROM t;"
    );
    assert!(!ids(&findings).contains(&"PERF003"));
}

#[test]
fn test_index_suggestion() {
    let findings = run(
        performance::rules(),
        "SELECT id FROM users WHERE email = 'a@b.c';"
    );
    let f = find(&findings, "PERF004").unwrap();
    assert_eq!(f.severity, Severity::Low);
    assert_eq!(f.suggestion, "CREATE INDEX idx_users_email ON users(email)");
    assert_eq!(f.column, Some(28));
}

#[test]
fn test_index_suggestion_covers_every_condition() {
    let findings = run(
        performance::rules(),
        "SELECT id FROM users\nWHERE status = 'open' AND (region = 'eu' OR users.tier = 2)\n\
         AND status = 'x' ORDER BY id = 1 LIMIT 5;"
    );
    let suggested: Vec<&str> = findings
        .iter()
        .filter(|f| f.rule_id == "PERF004")
        .map(|f| f.suggestion.as_str())
        .collect();
    assert_eq!(
        suggested,
        vec![
            "CREATE INDEX idx_users_status ON users(status)",
            "CREATE INDEX idx_users_region ON users(region)",
            "CREATE INDEX idx_users_tier ON users(tier)"
        ]
    );
}

#[test]
fn test_join_condition_is_not_an_index_suggestion() {
    let findings = run(
        performance::rules(),
        "SELECT a.id FROM a JOIN b ON b.id = a.b_id AND b.kind = 1 WHERE a.flag = 1 LIMIT 1;"
    );
    let columns: Vec<&str> = findings
        .iter()
        .filter(|f| f.rule_id == "PERF004")
        .map(|f| f.message.as_str())
        .collect();
    assert_eq!(
        columns,
        vec!["Column 'flag' is filtered by equality and is an index candidate"]
    );
}

#[test]
fn test_or_chain() {
    let findings = run(
        performance::rules(),
        "SELECT id FROM t WHERE a = 1 OR a = 2 OR a = 3 OR a = 4;"
    );
    let f = find(&findings, "PERF005").unwrap();
    assert!(f.message.contains("3 OR conditions"));

    let findings = run(performance::rules(), "SELECT id FROM t WHERE a = 1 OR a = 2;");
    assert!(!ids(&findings).contains(&"PERF005"));
}

#[test]
fn test_large_offset() {
    let findings = run(performance::rules(), "SELECT id FROM t LIMIT 10 OFFSET 50000;");
    let f = find(&findings, "PERF006").unwrap();
    assert!(f.message.contains("50000"));

    let findings = run(performance::rules(), "SELECT id FROM t LIMIT 10 OFFSET 1000;");
    assert!(!ids(&findings).contains(&"PERF006"));
}

#[test]
fn test_not_in_subquery() {
    let findings = run(
        performance::rules(),
        "SELECT id FROM a WHERE id NOT IN (SELECT a_id FROM b);"
    );
    assert!(ids(&findings).contains(&"PERF007"));
}

#[test]
fn test_union_without_all() {
    let findings = run(performance::rules(), "SELECT a FROM x UNION SELECT a FROM y;");
    assert!(ids(&findings).contains(&"PERF008"));

    let findings = run(performance::rules(), "SELECT a FROM x UNION ALL SELECT a FROM y;");
    assert!(!ids(&findings).contains(&"PERF008"));
}

#[test]
fn test_function_on_filtered_column() {
    let findings = run(
        performance::rules(),
        "SELECT id FROM orders WHERE YEAR(created_at) = 2024;"
    );
    let f = find(&findings, "PERF009").unwrap();
    assert!(f.message.contains("YEAR("));
}

#[test]
fn test_every_performance_finding_estimates_gain() {
    let sql = "SELECT * FROM t WHERE name LIKE '%x' OR a = 1 OR a = 2 OR a = 3 \
               UNION SELECT * FROM u ORDER BY 1 OFFSET 5000;";
    let findings = run(performance::rules(), sql);
    assert!(findings.len() >= 5);
    assert!(findings.iter().all(|f| f.estimated_improvement.is_some()));
}

// Runner

#[test]
fn test_runner_preserves_statement_order() {
    let sql = "DELETE FROM a;\nDELETE FROM b;\nDELETE FROM c;";
    let findings = run(semantic::rules(), sql);
    let lines: Vec<usize> = findings.iter().map(|f| f.line).collect();
    assert_eq!(lines, vec![1, 2, 3]);
}

#[test]
fn test_runner_config_overrides() {
    let mut severity = HashMap::new();
    severity.insert("perf001".to_string(), "critical".to_string());
    let config = RulesConfig {
        disabled: vec!["PERF004".to_string()],
        severity
    };
    let runner = RuleRunner::with_config(performance::rules(), &config);
    assert_eq!(runner.len(), performance::rules().len() - 1);

    let statements = segment("SELECT * FROM users WHERE id = 1;");
    let ctx = AnalysisContext {
        dialect:    Dialect::Generic,
        statements: &statements
    };
    let findings = runner.run(&ctx);
    assert!(!ids(&findings).contains(&"PERF004"));
    assert_eq!(find(&findings, "PERF001").unwrap().severity, Severity::Critical);
}
