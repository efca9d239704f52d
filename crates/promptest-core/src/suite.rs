//! Tests files: run configuration plus ordered test cases.

use serde::Deserialize;
use serde_yaml::Value;
use std::path::Path;

use crate::backend::GenerationParams;
use crate::bail_invalid;
use crate::error::Result;
use crate::prompt::{load_yaml, value_text, Variables};

/// Judge used by `model_graded` expectations that name no model
pub const DEFAULT_JUDGE_MODEL: &str = "gpt-3.5-turbo";

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 256;

/// Settings shared by every model invocation in a run
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunConfig {
    pub model_names: Vec<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl RunConfig {
    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.model_names.is_empty() {
            bail_invalid!("model_names", "empty list (at least one model is required)");
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            bail_invalid!("temperature", self.temperature);
        }
        if self.max_tokens == 0 {
            bail_invalid!("max_tokens", self.max_tokens);
        }
        Ok(())
    }
}

/// Contents of a tests file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestSuite {
    #[serde(flatten)]
    pub config: RunConfig,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    /// Load and validate a tests file
    pub fn load(path: &Path) -> Result<Self> {
        let suite: TestSuite = load_yaml(path, "tests")?;
        suite.config.validate()?;
        Ok(suite)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub variables: Variables,
    pub expected_output: ExpectedOutput,
}

/// What a model's output is checked against
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawExpectedOutput")]
pub enum ExpectedOutput {
    /// Pattern must match at the start of the output
    Regex { pattern: String },
    /// Output must equal the value exactly
    Literal { value: String },
    /// Output and `text` must parse to equal structures
    Structured { text: String },
    /// A second model checks natural-language conditions
    ModelJudged {
        model: String,
        conditions: Vec<String>,
    },
    /// Unrecognized `type` tag; never passes
    Unsupported { kind: String },
}

impl ExpectedOutput {
    pub fn kind(&self) -> &str {
        match self {
            ExpectedOutput::Regex { .. } => "regex",
            ExpectedOutput::Literal { .. } => "string",
            ExpectedOutput::Structured { .. } => "yaml",
            ExpectedOutput::ModelJudged { .. } => "model_graded",
            ExpectedOutput::Unsupported { kind } => kind,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawExpectedOutput {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    model: Option<String>,
}

impl TryFrom<RawExpectedOutput> for ExpectedOutput {
    type Error = String;

    fn try_from(raw: RawExpectedOutput) -> std::result::Result<Self, Self::Error> {
        let RawExpectedOutput { kind, value, model } = raw;

        let require = |value: Option<Value>| {
            value.ok_or_else(|| format!("expected_output of type {:?} requires a value", kind))
        };

        match kind.as_str() {
            "regex" => Ok(ExpectedOutput::Regex {
                pattern: scalar_text(require(value)?, &kind)?,
            }),
            "string" => Ok(ExpectedOutput::Literal {
                value: scalar_text(require(value)?, &kind)?,
            }),
            "yaml" | "structured" => {
                let text = match require(value)? {
                    Value::String(s) => s,
                    other => serde_yaml::to_string(&other).map_err(|e| e.to_string())?,
                };
                Ok(ExpectedOutput::Structured { text })
            }
            "model_graded" | "model-graded" => {
                let conditions = match require(value)? {
                    Value::Sequence(items) => items.iter().map(value_text).collect(),
                    Value::String(s) => vec![s],
                    other => {
                        return Err(format!(
                            "model_graded conditions must be a list of strings, got {:?}",
                            other
                        ))
                    }
                };
                Ok(ExpectedOutput::ModelJudged {
                    model: model.unwrap_or_else(|| DEFAULT_JUDGE_MODEL.to_string()),
                    conditions,
                })
            }
            _ => Ok(ExpectedOutput::Unsupported { kind: kind.clone() }),
        }
    }
}

fn scalar_text(value: Value, kind: &str) -> std::result::Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(_) | Value::Bool(_) => Ok(value_text(&value)),
        other => Err(format!(
            "expected_output of type {:?} requires a scalar value, got {:?}",
            kind, other
        )),
    }
}
