use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// sql-lens - Rule-based SQL analysis: defects, security, performance, schema
#[derive(Parser, Debug)]
#[command(name = "sql-lens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze SQL files
    Analyze {
        /// SQL files to analyze (use - for stdin)
        #[arg(required = true, num_args = 1..)]
        files: Vec<PathBuf>,

        /// SQL dialect hint; detected from the text when omitted
        #[arg(short, long, value_enum)]
        dialect: Option<Dialect>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        output_format: Format,

        /// Show suggestions, corrected SQL and debug logging
        #[arg(short, long)]
        verbose: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dialect {
    Generic,
    Mysql,
    #[value(alias = "postgres")]
    Postgresql,
    Oracle,
    #[value(name = "sql-server", alias = "mssql")]
    SqlServer,
    Sqlite
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
    Yaml
}
