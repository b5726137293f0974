// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use sql_lens::{
    document::{Dialect, SourceDocument, content_hash},
    rules::{Classification, Finding, FindingKind, Fix, RuleInfo, Severity}
};

const INFO: RuleInfo = RuleInfo {
    id:             "SEC001",
    name:           "Quote tautology",
    kind:           FindingKind::Security,
    category:       "sql_injection",
    severity:       Severity::Critical,
    classification: Classification::new("CWE-89", "Injection")
};

#[test]
fn test_severity_ordering() {
    assert!(Severity::Low < Severity::Medium);
    assert!(Severity::Medium < Severity::High);
    assert!(Severity::High < Severity::Critical);
    let max = [Severity::Medium, Severity::Critical, Severity::Low]
        .into_iter()
        .max();
    assert_eq!(max, Some(Severity::Critical));
}

#[test]
fn test_severity_parse() {
    assert_eq!(Severity::parse("LOW"), Some(Severity::Low));
    assert_eq!(Severity::parse("warning"), Some(Severity::Medium));
    assert_eq!(Severity::parse("error"), Some(Severity::High));
    assert_eq!(Severity::parse("Critical"), Some(Severity::Critical));
    assert_eq!(Severity::parse("fatal"), None);
}

#[test]
fn test_severity_display() {
    assert_eq!(Severity::High.to_string(), "HIGH");
    assert_eq!(FindingKind::Schema.to_string(), "Schema");
}

#[test]
fn test_finding_builder() {
    let finding = Finding::new(&INFO, 4, 2)
        .column(9)
        .message("Tautology in WHERE")
        .suggestion("Bind parameters");

    assert_eq!(finding.rule_id, "SEC001");
    assert_eq!(finding.kind, FindingKind::Security);
    assert_eq!(finding.severity, Severity::Critical);
    assert_eq!((finding.line, finding.column), (4, Some(9)));
    assert_eq!(finding.statement_index, 2);
    assert_eq!(finding.classification.cwe, Some("CWE-89"));
    assert!(finding.fix.is_none());
    assert!(finding.estimated_improvement.is_none());
}

#[test]
fn test_finding_serialization() {
    let finding = Finding::new(&INFO, 1, 0).message("m");
    let json = serde_json::to_value(&finding).unwrap();
    assert_eq!(json["rule_id"], "SEC001");
    assert_eq!(json["kind"], "security");
    assert_eq!(json["severity"], "critical");
    assert_eq!(json["cwe"], "CWE-89");
    assert_eq!(json["owasp"], "Injection");
    assert!(json.get("fix").is_none());
}

#[test]
fn test_fix_apply() {
    let fix = Fix::new("WHRE", "WHERE");
    assert_eq!(
        fix.apply("SELECT a FROM t WHRE b = 1", 0).as_deref(),
        Some("SELECT a FROM t WHERE b = 1")
    );
    assert_eq!(fix.apply("SELECT 1", 0), None);
}

#[test]
fn test_fix_apply_respects_start() {
    let fix = Fix::new("x", "y");
    assert_eq!(fix.apply("x x x", 1).as_deref(), Some("x y x"));
    assert_eq!(fix.apply("x", 10), None);
}

#[test]
fn test_dialect_parse_and_display() {
    assert_eq!("postgres".parse::<Dialect>(), Ok(Dialect::PostgreSql));
    assert_eq!("MSSQL".parse::<Dialect>(), Ok(Dialect::SqlServer));
    assert_eq!("sql-server".parse::<Dialect>(), Ok(Dialect::SqlServer));
    assert!("db2".parse::<Dialect>().is_err());
    assert_eq!(Dialect::SqlServer.to_string(), "sql_server");
    assert_eq!(Dialect::default(), Dialect::Generic);
}

#[test]
fn test_dialect_detection() {
    assert_eq!(Dialect::detect("SELECT 1 FROM DUAL WHERE ROWNUM < 2"), Dialect::Oracle);
    assert_eq!(Dialect::detect("PRAGMA foreign_keys = ON;"), Dialect::Sqlite);
    assert_eq!(
        Dialect::detect("CREATE TABLE t (id INT IDENTITY(1,1), name NVARCHAR(50));"),
        Dialect::SqlServer
    );
    assert_eq!(Dialect::detect("SELECT 1;"), Dialect::Generic);
}

#[test]
fn test_source_document() {
    let doc = SourceDocument::new("SELECT 1;\nSELECT 2;\n", Some(Dialect::MySql));
    assert_eq!(doc.line_count(), 2);
    assert_eq!(doc.declared_dialect(), Some(Dialect::MySql));
    assert_eq!(doc.dialect(), Dialect::MySql);
    assert_eq!(doc.content_hash(), content_hash("SELECT 1;\nSELECT 2;\n"));
    assert_ne!(doc.content_hash(), content_hash("SELECT 1;\nSELECT 2;"));
}
