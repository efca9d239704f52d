//! Promptest - evaluate prompt templates against language models
//!
//! Renders a prompt template for each test case, runs it on every configured
//! model, scores the outputs and writes one result snapshot per model.

mod cli;
mod commands;

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use cli::Cli;
use promptest_core::error::ExitCode as PromptestExitCode;
use promptest_core::logging;

fn main() -> ExitCode {
    let start = Instant::now();
    let cli = Cli::parse();

    let log_json = logging::json_requested();
    if let Err(e) = logging::init_tracing(log_json) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::debug!(elapsed = ?start.elapsed(), "parse_args");

    match commands::run::execute(&cli) {
        Ok(()) => ExitCode::from(PromptestExitCode::Success as u8),
        Err(e) => {
            if log_json {
                eprintln!("{}", e.to_json());
            } else {
                eprintln!("error: {}", e);
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
