//! In-process model client for tests.

use std::cell::RefCell;

use super::{Backend, CompletionRequest, GenerationParams, ModelClient};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCall {
    pub model: String,
    pub backend: Backend,
    pub prompt: String,
    pub params: GenerationParams,
}

type Handler = Box<dyn Fn(&CompletionRequest<'_>) -> Result<String>>;

/// Answers every request with `handler` and records what was asked.
pub(crate) struct ScriptedClient {
    handler: Handler,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedClient {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&CompletionRequest<'_>) -> Result<String> + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Always reply with `text`
    pub fn constant(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }
}

impl ModelClient for ScriptedClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        self.calls.borrow_mut().push(RecordedCall {
            model: request.model.to_string(),
            backend: request.backend.clone(),
            prompt: request.prompt.to_string(),
            params: request.params,
        });
        (self.handler)(request)
    }
}
