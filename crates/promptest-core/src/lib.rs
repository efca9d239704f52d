//! Promptest Core Library
//!
//! Evaluates a prompt template against language models: renders the
//! template per test case, invokes each model through its backend, compares
//! outputs (literal, regex, structured, or model-graded) and writes result
//! snapshots.

pub mod backend;
pub mod compare;
pub mod config;
pub mod error;
pub mod logging;
pub mod prompt;
pub mod report;
pub mod runner;
pub mod structured;
pub mod suite;
