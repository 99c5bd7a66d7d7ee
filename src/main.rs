//! afib-detect - atrial fibrillation screening CLI
//!
//! Extracts R-R interval statistics from annotated ECG records, trains a
//! FA vs Normal classifier and scores new records with it.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use console::style;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    // Initialize logging; RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("error:").red().bold(), e);
            ExitCode::from(cli::exit_code_for(&e))
        }
    }
}
