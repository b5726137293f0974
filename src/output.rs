//! Report rendering for the command-line front end.
//!
//! Text output is meant for terminals and may be colored. JSON and YAML
//! serialize the complete [`AnalysisResult`] of every file.

use colored::Colorize;
use serde::Serialize;

use crate::{
    error::{AppResult, output_error},
    rules::{Finding, Severity},
    synthesis::AnalysisResult
};

/// Output format for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml
}

/// Output options
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format:  OutputFormat,
    pub colored: bool,
    pub verbose: bool
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format:  OutputFormat::Text,
            colored: true,
            verbose: false
        }
    }
}

/// Analysis of one input file.
#[derive(Debug, Serialize)]
pub struct FileReport<'a> {
    pub file:     &'a str,
    pub analysis: &'a AnalysisResult
}

/// Render reports in the requested format.
pub fn format_reports(reports: &[FileReport<'_>], opts: &OutputOptions) -> AppResult<String> {
    match opts.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(reports).map_err(|e| output_error("JSON", e))
        }
        OutputFormat::Yaml => serde_yaml::to_string(reports).map_err(|e| output_error("YAML", e)),
        OutputFormat::Text => Ok(reports
            .iter()
            .map(|report| format_text(report, opts))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn paint(text: &str, severity: Severity, colored: bool) -> String {
    if !colored {
        return text.to_string();
    }
    match severity {
        Severity::Critical => text.red().bold().to_string(),
        Severity::High => text.red().to_string(),
        Severity::Medium => text.yellow().to_string(),
        Severity::Low => text.blue().to_string()
    }
}

fn heading(text: &str, colored: bool) -> String {
    if colored {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

fn score_label(score: u32, colored: bool) -> String {
    let label = format!("{}/100", score);
    if !colored {
        return label;
    }
    if score >= 80 {
        label.green().to_string()
    } else if score >= 50 {
        label.yellow().to_string()
    } else {
        label.red().to_string()
    }
}

fn format_finding(finding: &Finding, opts: &OutputOptions) -> String {
    let position = match finding.column {
        Some(column) => format!("{}:{}", finding.line, column),
        None => finding.line.to_string()
    };
    let severity = paint(&format!("[{}]", finding.severity), finding.severity, opts.colored);
    let mut line = format!(
        "  {} {} line {}: {}",
        severity, finding.rule_id, position, finding.message
    );
    if let Some(cwe) = finding.classification.cwe {
        line.push_str(&format!(" ({})", cwe));
    }
    line.push('\n');
    if opts.verbose && !finding.suggestion.is_empty() {
        line.push_str(&format!("      Suggestion: {}\n", finding.suggestion));
    }
    if opts.verbose
        && let Some(estimate) = &finding.estimated_improvement
    {
        line.push_str(&format!("      Expected gain: {}\n", estimate));
    }
    line
}

fn format_section(out: &mut String, title: &str, findings: &[Finding], opts: &OutputOptions) {
    if findings.is_empty() {
        return;
    }
    out.push_str(&heading(&format!("{} ({}):", title, findings.len()), opts.colored));
    out.push('\n');
    for finding in findings {
        out.push_str(&format_finding(finding, opts));
    }
    out.push('\n');
}

fn format_text(report: &FileReport<'_>, opts: &OutputOptions) -> String {
    let result = report.analysis;
    let mut out = String::new();
    let title = format!("=== {} ===", report.file);
    if opts.colored {
        out.push_str(&title.cyan().bold().to_string());
    } else {
        out.push_str(&title);
    }
    out.push('\n');
    out.push_str(&format!(
        "Dialect: {}  Lines: {}  Statements: {}\n",
        result.database_type, result.total_lines, result.total_statements
    ));
    out.push_str(&format!(
        "Quality: {}  Complexity: {}/100\n",
        score_label(result.quality_score, opts.colored),
        result.complexity_score
    ));
    if opts.verbose {
        let s = &result.category_scores;
        out.push_str(&format!(
            "  syntax {}  semantic {}  security {}  performance {}  schema {}\n",
            s.syntax, s.semantic, s.security, s.performance, s.schema
        ));
    }
    out.push('\n');

    format_section(&mut out, "Syntax errors", &result.syntax_errors, opts);
    format_section(&mut out, "Semantic errors", &result.semantic_errors, opts);
    format_section(&mut out, "Performance issues", &result.performance_issues, opts);
    format_section(
        &mut out,
        "Security vulnerabilities",
        &result.security_vulnerabilities,
        opts
    );
    format_section(&mut out, "Schema findings", &result.schema_findings, opts);

    if result.finding_count() == 0 {
        let clean = "No issues found";
        if opts.colored {
            out.push_str(&clean.green().to_string());
        } else {
            out.push_str(clean);
        }
        out.push_str("\n\n");
    }

    if !result.tables.is_empty() {
        out.push_str(&heading("Tables:", opts.colored));
        out.push('\n');
        for table in &result.tables {
            let keys: Vec<&str> = table.primary_key.iter().map(|k| k.as_str()).collect();
            out.push_str(&format!(
                "  {} ({} columns, primary key: {})\n",
                table.name,
                table.columns.len(),
                if keys.is_empty() {
                    "none".to_string()
                } else {
                    keys.join(", ")
                }
            ));
        }
        for rel in &result.relationships {
            out.push_str(&format!(
                "  {}.{} -> {}{}\n",
                rel.from_table,
                rel.from_column,
                rel.to_table,
                rel.to_column
                    .as_ref()
                    .map(|c| format!(".{}", c))
                    .unwrap_or_default()
            ));
        }
        out.push('\n');
    }

    if !result.recommendations.is_empty() {
        out.push_str(&heading("Recommendations:", opts.colored));
        out.push('\n');
        for recommendation in &result.recommendations {
            out.push_str(&format!("  - {}\n", recommendation));
        }
        out.push('\n');
    }

    if opts.verbose && !result.corrected_sql.is_empty() {
        out.push_str(&heading("Corrected SQL:", opts.colored));
        out.push('\n');
        out.push_str(&result.corrected_sql);
        if !result.corrected_sql.ends_with('\n') {
            out.push('\n');
        }
    }

    out
}
