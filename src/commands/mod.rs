//! CLI commands for promptest

pub mod run;
