//! Security signatures.
//!
//! Every rule is a line-scoped [`PatternRule`]: the pattern is matched
//! against each line of a statement (comments already blanked, literals
//! intact) so the reported position points at the offending line.

use super::{Classification, FindingKind, MatchScope, PatternRule, Rule, RuleInfo, Severity};

const INJECTION: &str = "Injection";
const ACCESS_CONTROL: &str = "Broken Access Control";
const AUTH_FAILURES: &str = "Identification and Authentication Failures";

/// Security rules, in evaluation order.
pub fn rules() -> Vec<Box<dyn Rule>> {
    SIGNATURES
        .iter()
        .map(|sig| Box::new(sig.compile()) as Box<dyn Rule>)
        .collect()
}

const fn info(
    id: &'static str,
    name: &'static str,
    category: &'static str,
    severity: Severity,
    classification: Classification
) -> RuleInfo {
    RuleInfo {
        id,
        name,
        kind: FindingKind::Security,
        category,
        severity,
        classification
    }
}

const fn signature(
    info: RuleInfo,
    pattern: &'static str,
    message: &'static str,
    suggestion: &'static str
) -> PatternRule {
    PatternRule {
        info,
        pattern,
        scope: MatchScope::Line,
        message,
        suggestion,
        improvement: None
    }
}

const PARAMETERIZE: &str = "Use parameterized queries; never concatenate user input into SQL";

pub const SIGNATURES: &[PatternRule] = &[
    // injection
    signature(
        info(
            "SEC001",
            "Quote tautology",
            "sql_injection",
            Severity::Critical,
            Classification::new("CWE-89", INJECTION)
        ),
        r"'\s*OR\s*'[^']*'\s*=\s*'",
        "Always-true quoted comparison typical of SQL injection: {match}",
        PARAMETERIZE
    ),
    signature(
        info(
            "SEC002",
            "Numeric tautology",
            "sql_injection",
            Severity::High,
            Classification::new("CWE-89", INJECTION)
        ),
        r"\bOR\s+\d+\s*=\s*\d+\b",
        "Always-true numeric comparison typical of SQL injection: {match}",
        PARAMETERIZE
    ),
    signature(
        info(
            "SEC003",
            "UNION-based catalog extraction",
            "sql_injection",
            Severity::Critical,
            Classification::new("CWE-89", INJECTION)
        ),
        r"\bUNION\s+(?:ALL\s+)?SELECT\b.*\binformation_schema\b",
        "UNION SELECT against information_schema, a schema extraction probe",
        PARAMETERIZE
    ),
    signature(
        info(
            "SEC004",
            "Time-based blind injection",
            "sql_injection",
            Severity::High,
            Classification::new("CWE-89", INJECTION)
        ),
        r"\bSLEEP\s*\(",
        "SLEEP() call used for time-based blind injection",
        PARAMETERIZE
    ),
    signature(
        info(
            "SEC005",
            "WAITFOR DELAY",
            "sql_injection",
            Severity::High,
            Classification::new("CWE-89", INJECTION)
        ),
        r"\bWAITFOR\s+DELAY\b",
        "WAITFOR DELAY used for time-based blind injection",
        PARAMETERIZE
    ),
    signature(
        info(
            "SEC006",
            "Boolean-based blind injection",
            "sql_injection",
            Severity::High,
            Classification::new("CWE-89", INJECTION)
        ),
        r"\bAND\s+\d+\s*=\s*\d+\b",
        "Constant boolean comparison typical of blind injection: {match}",
        PARAMETERIZE
    ),
    // dangerous functions
    signature(
        info(
            "SEC007",
            "LOAD_FILE call",
            "dangerous_function",
            Severity::Critical,
            Classification::new("CWE-73", INJECTION)
        ),
        r"\bLOAD_FILE\s*\(",
        "LOAD_FILE reads arbitrary files from the database server",
        "Remove file access from queries and revoke the FILE privilege"
    ),
    signature(
        info(
            "SEC008",
            "File export",
            "dangerous_function",
            Severity::Critical,
            Classification::new("CWE-73", INJECTION)
        ),
        r"\bINTO\s+(?:OUTFILE|DUMPFILE)\b",
        "{match} writes query results to the server filesystem",
        "Export data through the application instead of the database server"
    ),
    signature(
        info(
            "SEC009",
            "xp_cmdshell call",
            "dangerous_function",
            Severity::Critical,
            Classification::new("CWE-78", INJECTION)
        ),
        r"\bxp_cmdshell\b",
        "xp_cmdshell executes operating system commands",
        "Disable xp_cmdshell and run system tasks outside the database"
    ),
    signature(
        info(
            "SEC010",
            "OLE automation",
            "dangerous_function",
            Severity::High,
            Classification::new("CWE-78", INJECTION)
        ),
        r"\bsp_OACreate\b",
        "sp_OACreate instantiates OLE objects with server privileges",
        "Disable OLE Automation Procedures"
    ),
    // privileges
    signature(
        info(
            "SEC011",
            "GRANT statement",
            "privilege_escalation",
            Severity::High,
            Classification::new("CWE-269", ACCESS_CONTROL)
        ),
        r"\bGRANT\b",
        "GRANT changes database privileges",
        "Manage privileges through reviewed migrations with least privilege"
    ),
    signature(
        info(
            "SEC012",
            "CREATE USER",
            "privilege_escalation",
            Severity::High,
            Classification::new("CWE-269", ACCESS_CONTROL)
        ),
        r"\bCREATE\s+USER\b",
        "CREATE USER adds a database account",
        "Provision accounts outside application SQL"
    ),
    signature(
        info(
            "SEC013",
            "ALL PRIVILEGES",
            "privilege_escalation",
            Severity::High,
            Classification::new("CWE-269", ACCESS_CONTROL)
        ),
        r"\bALL\s+PRIVILEGES\b",
        "ALL PRIVILEGES grants unrestricted access",
        "Grant only the specific privileges required"
    ),
    signature(
        info(
            "SEC014",
            "SUPER privilege",
            "privilege_escalation",
            Severity::High,
            Classification::new("CWE-269", ACCESS_CONTROL)
        ),
        r"\bSUPER\b",
        "SUPER privilege bypasses server-level restrictions",
        "Never grant SUPER to application accounts"
    ),
    // credentials
    signature(
        info(
            "SEC015",
            "Hard-coded password",
            "hardcoded_credentials",
            Severity::High,
            Classification::new("CWE-798", AUTH_FAILURES)
        ),
        r"\bPASSWORD\s*=\s*'[^']*'",
        "Hard-coded password in SQL text",
        "Load credentials from a secret store, never from SQL source"
    ),
    signature(
        info(
            "SEC016",
            "IDENTIFIED BY literal",
            "hardcoded_credentials",
            Severity::High,
            Classification::new("CWE-798", AUTH_FAILURES)
        ),
        r"\bIDENTIFIED\s+BY\s+'[^']*'",
        "Account password given as a literal",
        "Load credentials from a secret store, never from SQL source"
    ),
    // catalog access
    signature(
        info(
            "SEC017",
            "System catalog access",
            "information_disclosure",
            Severity::Medium,
            Classification::cwe("CWE-200")
        ),
        r"\b(?:information_schema|pg_catalog)\.\w+|\bmysql\.user\b",
        "Query reads the system catalog: {match}",
        "Restrict catalog access for application accounts"
    ),
    // destructive statements
    signature(
        info(
            "SEC018",
            "DROP statement",
            "destructive_operation",
            Severity::High,
            Classification::NONE
        ),
        r"\bDROP\s+(?:TABLE|DATABASE|SCHEMA)\b",
        "{match} permanently destroys data",
        "Ensure backups exist and run destructive DDL through reviewed migrations"
    ),
    signature(
        info(
            "SEC019",
            "TRUNCATE statement",
            "destructive_operation",
            Severity::High,
            Classification::NONE
        ),
        r"\bTRUNCATE\b",
        "TRUNCATE removes all rows without logging individual deletions",
        "Use DELETE with WHERE for safer data removal, or ensure backups exist"
    ),
    signature(
        info(
            "SEC020",
            "UNION SELECT NULL probe",
            "sql_injection",
            Severity::High,
            Classification::new("CWE-89", INJECTION)
        ),
        r"\bUNION\s+(?:ALL\s+)?SELECT\s+NULL\b",
        "UNION SELECT NULL is used to probe column counts",
        PARAMETERIZE
    ),
    signature(
        info(
            "SEC021",
            "Heavy-query blind injection",
            "sql_injection",
            Severity::High,
            Classification::new("CWE-89", INJECTION)
        ),
        r"\b(?:BENCHMARK|PG_SLEEP)\s*\(",
        "BENCHMARK() or PG_SLEEP() call used for time-based blind injection",
        PARAMETERIZE
    ),
    signature(
        info(
            "SEC022",
            "Engine catalog access",
            "information_disclosure",
            Severity::Medium,
            Classification::cwe("CWE-200")
        ),
        r"\bsqlite_master\b|\bsys\.sql_logins\b",
        "Query reads engine metadata: {match}",
        "Restrict catalog access for application accounts"
    ),
    signature(
        info(
            "SEC023",
            "Dynamic SQL execution",
            "sql_injection",
            Severity::High,
            Classification::new("CWE-89", INJECTION)
        ),
        r"\bEXEC(?:UTE)?\s*\(\s*@|\bEXECUTE\s+IMMEDIATE\b",
        "Dynamic SQL executed from a string: {match}",
        "Use sp_executesql or bind variables instead of string execution"
    )
];
