//! CLI argument parsing for promptest

use std::path::PathBuf;

use clap::Parser;

/// Test LLM models with a given template and inputs.
#[derive(Parser, Debug)]
#[command(name = "promptest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the prompt template YAML file
    #[arg(long, short)]
    pub prompt: PathBuf,

    /// Path to the tests YAML file
    #[arg(long, short)]
    pub tests: PathBuf,
}
