//! Error types and exit codes for promptest
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure (I/O, transport, serialization)
//! - 2: Usage/configuration error (invalid model name, bad template declaration)
//! - 3: Data error (missing or unparsable prompt/tests file)

mod macros;

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the promptest binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage or configuration error (2)
    Usage = 2,
    /// Input file could not be read or parsed (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Errors that can occur while loading, invoking or reporting
#[derive(Error, Debug)]
pub enum PromptestError {
    // Usage/configuration errors (exit code 2)
    #[error(
        "invalid model name: {name} (expected a chat model, a completion model, \
         or a path to a local model file starting with '/', './' or '../')"
    )]
    InvalidModel { name: String },

    #[error("invalid {context}: {value}")]
    InvalidValue { context: String, value: String },

    #[error("template variable {name:?} is {problem}")]
    TemplateVariable { name: String, problem: String },

    #[error("invalid configuration in {path:?}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    // Data errors (exit code 3)
    #[error("{kind} file not found: {path:?}")]
    InputNotFound { kind: String, path: PathBuf },

    #[error("invalid {kind} file {path:?}: {reason}")]
    InvalidInput {
        kind: String,
        path: PathBuf,
        reason: String,
    },

    // Generic failures (exit code 1)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("model call to {model} failed: {reason}")]
    ModelCall { model: String, reason: String },

    #[error("failed to {operation} {target}: {reason}")]
    FailedOperationWithTarget {
        operation: String,
        target: String,
        reason: String,
    },
}

impl PromptestError {
    /// Create an error for a model name that matches no backend
    pub fn invalid_model(name: impl Into<String>) -> Self {
        PromptestError::InvalidModel { name: name.into() }
    }

    /// Create an error for an invalid value or configuration
    pub fn invalid_value(context: &str, value: impl std::fmt::Display) -> Self {
        PromptestError::InvalidValue {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an error for a template placeholder problem
    pub fn template_variable(name: impl Into<String>, problem: impl Into<String>) -> Self {
        PromptestError::TemplateVariable {
            name: name.into(),
            problem: problem.into(),
        }
    }

    /// Create an error for a failed call to a model backend
    pub fn model_call(model: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        PromptestError::ModelCall {
            model: model.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an error for a failed IO operation with context
    pub fn io_operation(
        operation: &str,
        path: impl std::fmt::Display,
        error: impl std::fmt::Display,
    ) -> Self {
        PromptestError::FailedOperationWithTarget {
            operation: operation.to_string(),
            target: path.to_string(),
            reason: error.to_string(),
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            PromptestError::InvalidModel { .. }
            | PromptestError::InvalidValue { .. }
            | PromptestError::TemplateVariable { .. }
            | PromptestError::InvalidConfig { .. } => ExitCode::Usage,

            PromptestError::InputNotFound { .. } | PromptestError::InvalidInput { .. } => {
                ExitCode::Data
            }

            PromptestError::Io(_)
            | PromptestError::Yaml(_)
            | PromptestError::Json(_)
            | PromptestError::ModelCall { .. }
            | PromptestError::FailedOperationWithTarget { .. } => ExitCode::Failure,
        }
    }

    /// Get the error type identifier
    pub fn error_type(&self) -> &'static str {
        match self {
            PromptestError::InvalidModel { .. } => "invalid_model",
            PromptestError::InvalidValue { .. } => "invalid_value",
            PromptestError::TemplateVariable { .. } => "template_variable",
            PromptestError::InvalidConfig { .. } => "invalid_config",
            PromptestError::InputNotFound { .. } => "input_not_found",
            PromptestError::InvalidInput { .. } => "invalid_input",
            PromptestError::Io(_) => "io_error",
            PromptestError::Yaml(_) => "yaml_error",
            PromptestError::Json(_) => "json_error",
            PromptestError::ModelCall { .. } => "model_call",
            PromptestError::FailedOperationWithTarget { .. } => "failed_operation_with_target",
        }
    }

    /// Convert error to JSON representation for structured error output.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }
}

/// Result type alias for promptest operations
pub type Result<T> = std::result::Result<T, PromptestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_model_names_categories() {
        let err = PromptestError::invalid_model("not-a-model");
        let msg = err.to_string();
        assert!(msg.contains("not-a-model"));
        assert!(msg.contains("chat model"));
        assert!(msg.contains("completion model"));
        assert!(msg.contains("local model"));
        assert_eq!(err.exit_code(), ExitCode::Usage);
    }

    #[test]
    fn test_exit_code_classes() {
        let data = PromptestError::InputNotFound {
            kind: "prompt".to_string(),
            path: PathBuf::from("missing.yaml"),
        };
        assert_eq!(data.exit_code(), ExitCode::Data);

        let failure = PromptestError::model_call("gpt-4", "timeout");
        assert_eq!(failure.exit_code(), ExitCode::Failure);
        assert_eq!(i32::from(failure.exit_code()), 1);
    }

    #[test]
    fn test_to_json_shape() {
        let err = PromptestError::invalid_value("temperature", "hot");
        let json = err.to_json();
        assert_eq!(json["error"]["code"], 2);
        assert_eq!(json["error"]["type"], "invalid_value");
        assert_eq!(json["error"]["message"], "invalid temperature: hot");
    }
}
