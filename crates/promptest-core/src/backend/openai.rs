//! OpenAI-compatible HTTP transport for hosted chat and completion models.

use serde_json::Value;
use std::time::Duration;
use ureq::Agent;

use super::GenerationParams;
use crate::config::ProviderConfig;
use crate::error::{PromptestError, Result};

pub const CHAT_PATH: &str = "/v1/chat/completions";
pub const COMPLETION_PATH: &str = "/v1/completions";

/// Synchronous client for `/v1/chat/completions` and `/v1/completions`
pub struct OpenAiClient {
    api_base: String,
    api_key: Option<String>,
    agent: Agent,
}

impl OpenAiClient {
    pub fn new(api_base: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
            agent,
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(
            config.api_base.clone(),
            config.api_key.clone(),
            config.timeout(),
        )
    }

    /// Send the prompt as a single user turn
    pub fn chat(&self, model: &str, prompt: &str, params: GenerationParams) -> Result<String> {
        let body = serde_json::json!({
            "model": model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        });

        let response = self.post(model, CHAT_PATH, &body)?;
        response
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| PromptestError::model_call(model, "invalid chat response format"))
    }

    /// Send the prompt as a raw completion prompt
    pub fn completion(&self, model: &str, prompt: &str, params: GenerationParams) -> Result<String> {
        let body = serde_json::json!({
            "model": model,
            "prompt": prompt,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        });

        let response = self.post(model, COMPLETION_PATH, &body)?;
        response
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|c| c.get("text"))
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| PromptestError::model_call(model, "invalid completion response format"))
    }

    fn post(&self, model: &str, path: &str, body: &Value) -> Result<Value> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            PromptestError::model_call(
                model,
                "OPENAI_API_KEY or PROMPTEST_API_KEY environment variable must be set",
            )
        })?;

        let url = format!("{}{}", self.api_base, path);
        tracing::debug!(model, url = %url, "post");

        let mut response = self
            .agent
            .post(&url)
            .header("Authorization", &format!("Bearer {}", api_key))
            .send_json(body)
            .map_err(|e| PromptestError::model_call(model, format!("transport error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.body_mut().read_to_string().unwrap_or_default();
            return Err(PromptestError::model_call(
                model,
                format!("API request failed: {} - {}", status.as_u16(), error_text),
            ));
        }

        response
            .body_mut()
            .read_json::<Value>()
            .map_err(|e| PromptestError::model_call(model, format!("unreadable response: {}", e)))
    }
}
