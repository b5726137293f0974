// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use sql_lens::{
    config::RulesConfig,
    document::Dialect,
    rules::{AnalysisContext, Finding, FindingKind, RuleRunner, Severity, security},
    segment::segment
};

fn scan(sql: &str) -> Vec<Finding> {
    let statements = segment(sql);
    let ctx = AnalysisContext {
        dialect:    Dialect::Generic,
        statements: &statements
    };
    RuleRunner::with_config(security::rules(), &RulesConfig::default()).run(&ctx)
}

fn ids(findings: &[Finding]) -> Vec<&'static str> {
    findings.iter().map(|f| f.rule_id).collect()
}

#[test]
fn test_signatures_have_unique_ids() {
    let mut seen: Vec<&str> = security::SIGNATURES.iter().map(|s| s.info.id).collect();
    let total = seen.len();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), total);
    assert_eq!(security::rules().len(), total);
    assert!(
        security::SIGNATURES
            .iter()
            .all(|s| s.info.kind == FindingKind::Security)
    );
}

#[test]
fn test_quote_tautology() {
    let findings = scan("SELECT * FROM users WHERE name = '' OR '1'='1';");
    let f = findings.iter().find(|f| f.rule_id == "SEC001").unwrap();
    assert_eq!(f.severity, Severity::Critical);
    assert_eq!(f.category, "sql_injection");
    assert_eq!(f.classification.cwe, Some("CWE-89"));
    assert_eq!(f.classification.owasp, Some("Injection"));
}

#[test]
fn test_signature_catalog() {
    let cases = [
        ("SELECT * FROM t WHERE id = 1 OR 1=1;", "SEC002"),
        (
            "SELECT id FROM t WHERE 1 = 0 UNION SELECT table_name FROM information_schema.tables;",
            "SEC003"
        ),
        ("SELECT SLEEP(5);", "SEC004"),
        ("WAITFOR DELAY '0:0:5';", "SEC005"),
        ("SELECT id FROM t WHERE id = 1 AND 1=1;", "SEC006"),
        ("SELECT LOAD_FILE('/etc/passwd');", "SEC007"),
        ("SELECT * FROM users INTO OUTFILE '/tmp/users.csv';", "SEC008"),
        ("EXEC xp_cmdshell 'dir';", "SEC009"),
        ("EXEC sp_OACreate 'WScript.Shell', @obj OUT;", "SEC010"),
        ("GRANT SELECT ON orders TO reporting;", "SEC011"),
        ("CREATE USER app;", "SEC012"),
        ("GRANT ALL PRIVILEGES ON *.* TO 'root'@'%';", "SEC013"),
        ("GRANT SUPER ON *.* TO 'app'@'localhost';", "SEC014"),
        ("UPDATE accounts SET password = 'hunter2' WHERE id = 1;", "SEC015"),
        ("ALTER USER app IDENTIFIED BY 's3cret';", "SEC016"),
        ("SELECT user, host FROM mysql.user;", "SEC017"),
        ("DROP TABLE customers;", "SEC018"),
        ("TRUNCATE audit_log;", "SEC019"),
        ("SELECT a FROM t UNION SELECT NULL, NULL;", "SEC020"),
        ("SELECT PG_SLEEP(10);", "SEC021"),
        ("SELECT name FROM sqlite_master;", "SEC022"),
        ("EXEC(@sql);", "SEC023"),
        ("EXECUTE IMMEDIATE stmt;", "SEC023")
    ];
    for (sql, expected) in cases {
        let findings = scan(sql);
        assert!(
            ids(&findings).contains(&expected),
            "{} not reported for {:?}: {:?}",
            expected,
            sql,
            ids(&findings)
        );
    }
}

#[test]
fn test_time_delay_messages_name_the_call() {
    let findings = scan("SELECT SLEEP(5);\nSELECT BENCHMARK(1000000, MD5('x'));");
    let sleep = findings.iter().find(|f| f.rule_id == "SEC004").unwrap();
    assert_eq!(sleep.message, "SLEEP() call used for time-based blind injection");
    let heavy = findings.iter().find(|f| f.rule_id == "SEC021").unwrap();
    assert_eq!(
        heavy.message,
        "BENCHMARK() or PG_SLEEP() call used for time-based blind injection"
    );
}

#[test]
fn test_classifications() {
    let findings = scan("SELECT LOAD_FILE('/etc/passwd');");
    assert_eq!(findings[0].classification.cwe, Some("CWE-73"));

    let findings = scan("EXEC xp_cmdshell 'whoami';");
    let f = findings.iter().find(|f| f.rule_id == "SEC009").unwrap();
    assert_eq!(f.classification.cwe, Some("CWE-78"));
    assert_eq!(f.severity, Severity::Critical);

    let findings = scan("GRANT ALL PRIVILEGES ON db.* TO 'u'@'h';");
    let f = findings.iter().find(|f| f.rule_id == "SEC013").unwrap();
    assert_eq!(f.category, "privilege_escalation");
    assert_eq!(f.classification.owasp, Some("Broken Access Control"));

    let findings = scan("CREATE USER app IDENTIFIED BY 'pw';");
    let f = findings.iter().find(|f| f.rule_id == "SEC016").unwrap();
    assert_eq!(f.category, "hardcoded_credentials");
    assert_eq!(f.classification.cwe, Some("CWE-798"));

    let findings = scan("DROP DATABASE prod;");
    let f = findings.iter().find(|f| f.rule_id == "SEC018").unwrap();
    assert_eq!(f.category, "destructive_operation");
    assert_eq!(f.classification.cwe, None);
}

#[test]
fn test_finding_points_at_matching_line() {
    let sql = "SELECT name\nFROM users\nWHERE id = 1 UNION SELECT table_name FROM information_schema.tables;";
    let findings = scan(sql);
    let union = findings.iter().find(|f| f.rule_id == "SEC003").unwrap();
    assert_eq!(union.line, 3);
    assert_eq!(union.column, Some(14));
    let catalog = findings.iter().find(|f| f.rule_id == "SEC017").unwrap();
    assert_eq!(catalog.line, 3);
    assert_eq!(catalog.severity, Severity::Medium);
}

#[test]
fn test_one_finding_per_matching_line() {
    let sql = "GRANT SELECT ON a TO r;\nGRANT SELECT ON b TO r;\nGRANT SELECT ON c TO r;";
    let findings = scan(sql);
    let grants: Vec<usize> = findings
        .iter()
        .filter(|f| f.rule_id == "SEC011")
        .map(|f| f.line)
        .collect();
    assert_eq!(grants, vec![1, 2, 3]);
}

#[test]
fn test_commented_out_code_is_ignored() {
    let findings = scan("-- EXEC xp_cmdshell 'dir'\n/* DROP TABLE t; */\nSELECT id FROM t;");
    assert!(findings.is_empty());
}

#[test]
fn test_clean_query_has_no_findings() {
    let findings = scan(
        "SELECT o.id, c.name FROM orders o JOIN customers c ON c.id = o.customer_id \
         WHERE o.status = 'open' LIMIT 50;"
    );
    assert!(findings.is_empty(), "{:?}", ids(&findings));
}

#[test]
fn test_disabled_signature() {
    let config = RulesConfig {
        disabled: vec!["SEC019".to_string()],
        ..Default::default()
    };
    let statements = segment("TRUNCATE audit_log;");
    let ctx = AnalysisContext {
        dialect:    Dialect::Generic,
        statements: &statements
    };
    let findings = RuleRunner::with_config(security::rules(), &config).run(&ctx);
    assert!(findings.is_empty());
}
