//! Application logic for the sql-lens CLI.
//!
//! This module contains the command implementation separated from the main
//! entry point to enable testing.

use std::{
    fs::read_to_string,
    io::{self, Read},
    path::Path,
    sync::Arc
};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::{
    cli::{Dialect, Format},
    config::Config,
    document,
    engine::Engine,
    error::{AppResult, file_read_error},
    output::{FileReport, OutputFormat, OutputOptions, format_reports},
    rules::Severity,
    synthesis::AnalysisResult
};

/// Parameters for the analyze command
#[derive(Debug, Clone)]
pub struct AnalyzeParams {
    pub files:         Vec<String>,
    pub dialect:       Option<Dialect>,
    pub output_format: Format,
    pub verbose:       bool,
    pub no_color:      bool
}

/// Rendered output and the exit code it implies
#[derive(Debug, Clone)]
pub struct AnalyzeOutcome {
    pub exit_code: i32,
    pub output:    String
}

/// Convert CLI dialect to the engine dialect
pub fn convert_dialect(dialect: Dialect) -> document::Dialect {
    match dialect {
        Dialect::Generic => document::Dialect::Generic,
        Dialect::Mysql => document::Dialect::MySql,
        Dialect::Postgresql => document::Dialect::PostgreSql,
        Dialect::Oracle => document::Dialect::Oracle,
        Dialect::SqlServer => document::Dialect::SqlServer,
        Dialect::Sqlite => document::Dialect::Sqlite
    }
}

/// Convert CLI format to internal OutputFormat
pub fn convert_format(format: Format) -> OutputFormat {
    match format {
        Format::Text => OutputFormat::Text,
        Format::Json => OutputFormat::Json,
        Format::Yaml => OutputFormat::Yaml
    }
}

/// Exit code for the highest severity found.
///
/// - `0` - No findings, or only low severity
/// - `1` - At least one medium finding
/// - `2` - At least one high or critical finding
pub fn calculate_exit_code(results: &[Arc<AnalysisResult>]) -> i32 {
    match results.iter().filter_map(|r| r.max_severity()).max() {
        Some(Severity::Critical | Severity::High) => 2,
        Some(Severity::Medium) => 1,
        _ => 0
    }
}

/// Read SQL from a file, or from stdin for "-"
pub fn read_sql_input(path: &str) -> AppResult<String> {
    if path == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| file_read_error("stdin", e))?;
        Ok(buffer)
    } else {
        read_to_string(Path::new(path)).map_err(|e| file_read_error(path, e))
    }
}

/// Create output options from parameters
pub fn create_output_options(format: Format, no_color: bool, verbose: bool) -> OutputOptions {
    OutputOptions {
        format: convert_format(format),
        colored: !no_color,
        verbose
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("{bar:30.green} {pos}/{len} {msg}") {
        pb.set_style(style);
    }
    pb
}

/// Run the analyze command
pub fn run_analyze(params: AnalyzeParams, config: &Config) -> AppResult<AnalyzeOutcome> {
    let sources = params
        .files
        .iter()
        .map(|file| read_sql_input(file).map(|sql| (file.as_str(), sql)))
        .collect::<AppResult<Vec<_>>>()?;

    let engine = Engine::new(config);
    let dialect = params.dialect.map(convert_dialect);
    let opts = create_output_options(params.output_format, params.no_color, params.verbose);

    let pb = (sources.len() > 1 && opts.format == OutputFormat::Text)
        .then(|| progress_bar(sources.len()));
    let mut results = Vec::with_capacity(sources.len());
    for (file, sql) in &sources {
        if let Some(pb) = &pb {
            pb.set_message(file.to_string());
        }
        results.push(engine.analyze(sql, dialect));
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let stats = engine.cache().stats();
    debug!(hits = stats.hits, misses = stats.misses, "cache usage");

    let reports: Vec<FileReport<'_>> = sources
        .iter()
        .zip(&results)
        .map(|((file, _), result)| FileReport {
            file,
            analysis: result
        })
        .collect();
    let output = format_reports(&reports, &opts)?;

    Ok(AnalyzeOutcome {
        exit_code: calculate_exit_code(&results),
        output
    })
}
