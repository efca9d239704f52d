//! Provider configuration: where hosted and local models are reached and
//! where snapshots are written.
//!
//! Values come from an optional `promptest.toml` in the working directory,
//! then environment overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PromptestError, Result};

/// Name of the optional configuration file
pub const CONFIG_FILE_NAME: &str = "promptest.toml";

/// Default OpenAI-compatible API base URL
pub const DEFAULT_API_BASE: &str = "https://api.openai.com";

/// Default request timeout for hosted models
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// Default executable used for local model files
pub const DEFAULT_LOCAL_RUNNER: &str = "llama-cli";

/// Default root directory for result snapshots
pub const DEFAULT_OUTPUT_DIR: &str = "prompt_test_results";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_base: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub local_runner: String,
    pub local_runner_args: Vec<String>,
    pub output_dir: PathBuf,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECONDS,
            local_runner: DEFAULT_LOCAL_RUNNER.to_string(),
            local_runner_args: Vec::new(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl ProviderConfig {
    /// Load `promptest.toml` from `dir` if present, then apply process
    /// environment overrides.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        let mut config = if config_path.exists() {
            Self::load(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| PromptestError::io_operation("read", path.display(), e))?;

        toml::from_str(&content).map_err(|e| PromptestError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Empty values are ignored; unparsable timeouts keep the current value.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(base) = get("PROMPTEST_API_BASE") {
            self.api_base = base;
        }

        if let Some(key) = get("PROMPTEST_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }

        if let Some(timeout) = get("PROMPTEST_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                self.timeout_secs = seconds;
            }
        }

        if let Some(runner) = get("PROMPTEST_LOCAL_RUNNER") {
            self.local_runner = runner;
        }

        if let Some(dir) = get("PROMPTEST_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }

        self.timeout_secs = self.timeout_secs.clamp(5, 600);
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
