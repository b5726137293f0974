//! sql-lens command-line entry point.

use std::process;

use clap::Parser;
use sql_lens::{
    app::{AnalyzeParams, run_analyze},
    cli::{Cli, Commands},
    config::Config,
    error::AppResult
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "sql_lens=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run() -> AppResult<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            files,
            dialect,
            output_format,
            verbose,
            no_color
        } => {
            init_tracing(verbose);
            let config = Config::load()?;
            let params = AnalyzeParams {
                files: files
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect(),
                dialect,
                output_format,
                verbose,
                no_color
            };
            let outcome = run_analyze(params, &config)?;
            println!("{}", outcome.output);
            Ok(outcome.exit_code)
        }
    }
}
