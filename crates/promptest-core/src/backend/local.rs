//! Local model files run through a llama.cpp-style command-line runner.

use std::path::Path;
use std::process::Command;
use std::time::Instant;

use super::GenerationParams;
use crate::config::ProviderConfig;
use crate::error::{PromptestError, Result};

/// Runs `<program> -m <model> -p <prompt> -n <max_tokens> --temp <t> [extra args]`
/// and returns its stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRunner {
    program: String,
    extra_args: Vec<String>,
}

impl LocalRunner {
    pub fn new(program: impl Into<String>, extra_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            extra_args,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(config.local_runner.clone(), config.local_runner_args.clone())
    }

    pub fn run(&self, model_path: &Path, prompt: &str, params: GenerationParams) -> Result<String> {
        let model = model_path.display().to_string();
        let start = Instant::now();

        let output = Command::new(&self.program)
            .arg("-m")
            .arg(model_path)
            .arg("-p")
            .arg(prompt)
            .arg("-n")
            .arg(params.max_tokens.to_string())
            .arg("--temp")
            .arg(params.temperature.to_string())
            .args(&self.extra_args)
            .output()
            .map_err(|e| {
                PromptestError::model_call(
                    &model,
                    format!("failed to start local runner {:?}: {}", self.program, e),
                )
            })?;

        tracing::debug!(model = %model, elapsed = ?start.elapsed(), "local_runner");

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PromptestError::model_call(
                &model,
                format!(
                    "local runner exited with {}: {}",
                    output.status,
                    stderr.trim()
                ),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
