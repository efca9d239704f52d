//! Model backends and the invoker that renders, calls and cleans up.
//!
//! A model name is classified once into a [`Backend`]; the transport behind
//! it is a [`ModelClient`], so comparison and running never touch HTTP or
//! subprocess details.

pub mod local;
pub mod openai;

#[cfg(test)]
pub(crate) mod testing;
#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::ProviderConfig;
use crate::error::{PromptestError, Result};
use crate::prompt::{PromptSpec, PromptTemplate, Variables};

pub use local::LocalRunner;
pub use openai::OpenAiClient;

/// Hosted models served through the chat completions endpoint
pub const CHAT_MODELS: &[&str] = &[
    "gpt-3.5-turbo",
    "gpt-3.5-turbo-0301",
    "gpt-3.5-turbo-0613",
    "gpt-3.5-turbo-16k",
    "gpt-3.5-turbo-16k-0613",
    "gpt-4",
    "gpt-4-0314",
    "gpt-4-0613",
    "gpt-4-32k",
    "gpt-4-32k-0314",
    "gpt-4-32k-0613",
    "gpt-4-turbo",
    "gpt-4o",
    "gpt-4o-mini",
];

/// Hosted models served through the legacy completions endpoint
pub const COMPLETION_MODELS: &[&str] = &[
    "text-davinci-003",
    "text-davinci-002",
    "text-curie-001",
    "text-babbage-001",
    "text-ada-001",
    "davinci",
    "curie",
    "babbage",
    "ada",
    "davinci-002",
    "babbage-002",
    "gpt-3.5-turbo-instruct",
];

/// Marker after which a local model's answer starts
pub const ANSWER_MARKER: &str = "Answer:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Chat,
    Completion,
    Local(PathBuf),
}

impl Backend {
    /// Classify a model name: chat set, completion set, then filesystem path.
    pub fn classify(model_name: &str) -> Result<Self> {
        if is_chat_model(model_name) {
            Ok(Backend::Chat)
        } else if COMPLETION_MODELS.contains(&model_name) {
            Ok(Backend::Completion)
        } else if looks_like_path(model_name) {
            Ok(Backend::Local(PathBuf::from(model_name)))
        } else {
            Err(PromptestError::invalid_model(model_name))
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Backend::Chat => "chat",
            Backend::Completion => "completion",
            Backend::Local(_) => "local",
        }
    }
}

pub fn is_chat_model(model_name: &str) -> bool {
    CHAT_MODELS.contains(&model_name)
}

fn looks_like_path(model_name: &str) -> bool {
    Path::new(model_name).is_absolute()
        || ["./", "../", ".\\", "..\\"]
            .iter()
            .any(|prefix| model_name.starts_with(prefix))
}

/// Sampling settings for one invocation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_tokens: u32,
}

/// A fully rendered prompt addressed to one backend
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub backend: &'a Backend,
    pub prompt: &'a str,
    pub params: GenerationParams,
}

/// Sends a rendered prompt to a model and returns its raw text.
pub trait ModelClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String>;
}

/// Routes each backend variant to its transport.
pub struct ProviderClient {
    hosted: OpenAiClient,
    local: LocalRunner,
}

impl ProviderClient {
    pub fn new(hosted: OpenAiClient, local: LocalRunner) -> Self {
        Self { hosted, local }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(OpenAiClient::from_config(config), LocalRunner::from_config(config))
    }
}

impl ModelClient for ProviderClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        match request.backend {
            Backend::Chat => self.hosted.chat(request.model, request.prompt, request.params),
            Backend::Completion => self
                .hosted
                .completion(request.model, request.prompt, request.params),
            Backend::Local(path) => self.local.run(path, request.prompt, request.params),
        }
    }
}

/// One model bound to the run's template and sampling settings
pub struct Invoker<'c> {
    model: String,
    backend: Backend,
    template: PromptTemplate,
    params: GenerationParams,
    client: &'c dyn ModelClient,
}

impl std::fmt::Debug for Invoker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("model", &self.model)
            .field("backend", &self.backend)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl<'c> Invoker<'c> {
    /// Classify `model_name` and bind it to the prompt.
    ///
    /// Local models get the template wrapped as `Question: ...\nAnswer:`.
    pub fn build(
        model_name: &str,
        prompt: &PromptSpec,
        params: GenerationParams,
        client: &'c dyn ModelClient,
    ) -> Result<Self> {
        let backend = Backend::classify(model_name)?;

        let template = match backend {
            Backend::Local(_) => PromptTemplate::new(
                &format!("Question: {}\n{}", prompt.template, ANSWER_MARKER),
                &prompt.input_variables,
            )?,
            Backend::Chat | Backend::Completion => {
                PromptTemplate::new(&prompt.template, &prompt.input_variables)?
            }
        };

        Ok(Self {
            model: model_name.to_string(),
            backend,
            template,
            params,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Render with `variables`, call the model and return cleaned-up text.
    pub fn invoke(&self, variables: &Variables) -> Result<String> {
        let start = Instant::now();
        let prompt = self.template.render(variables)?;

        let raw = self.client.complete(&CompletionRequest {
            model: &self.model,
            backend: &self.backend,
            prompt: &prompt,
            params: self.params,
        })?;

        tracing::debug!(
            model = %self.model,
            backend = self.backend.kind(),
            elapsed = ?start.elapsed(),
            "invoke"
        );

        Ok(match self.backend {
            Backend::Local(_) => match raw.strip_prefix(prompt.as_str()) {
                // Runner echoed the prompt; its own trailing marker is already consumed
                Some(answer) => answer.trim().to_string(),
                None => extract_answer(&raw),
            },
            Backend::Chat | Backend::Completion => raw.trim().to_string(),
        })
    }
}

/// Text after the first `Answer:` marker, trimmed; empty if there is none.
pub fn extract_answer(raw: &str) -> String {
    raw.split_once(ANSWER_MARKER)
        .map(|(_, answer)| answer.trim().to_string())
        .unwrap_or_default()
}
