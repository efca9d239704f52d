//! Model-graded comparison: a second model checks natural-language
//! conditions against the primary output and answers with a structured
//! verdict.

use std::time::Instant;

use super::Comparison;
use crate::backend::{
    is_chat_model, Backend, CompletionRequest, GenerationParams, ModelClient,
};
use crate::prompt::{PromptTemplate, Variables};
use crate::structured::{is_truthy, strip_code_fence, StructuredParser};

/// Bundled grading prompt with `{input_text}` and `{conditions}` placeholders
pub const GRADING_TEMPLATE: &str = include_str!("../../templates/model_graded.txt");

/// Token budget for a verdict; judges always run at temperature 0
pub const JUDGE_MAX_TOKENS: u32 = 512;

pub const JUDGE_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.0,
    max_tokens: JUDGE_MAX_TOKENS,
};

pub struct Judge<'c, P> {
    client: &'c dyn ModelClient,
    parser: P,
}

impl<'c, P: StructuredParser> Judge<'c, P> {
    pub fn new(client: &'c dyn ModelClient, parser: P) -> Self {
        Self { client, parser }
    }

    /// Ask `model` whether `output` meets every condition.
    ///
    /// Passes only when the verdict parses and its `pass` field is truthy.
    pub fn grade(&self, model: &str, output: &str, conditions: &[String]) -> Comparison {
        let start = Instant::now();

        let prompt = match render_grading_prompt(output, conditions) {
            Ok(prompt) => prompt,
            Err(e) => return Comparison::inconclusive(format!("grading template: {}", e)),
        };

        let backend = if is_chat_model(model) {
            Backend::Chat
        } else {
            Backend::Completion
        };

        let raw = match self.client.complete(&CompletionRequest {
            model,
            backend: &backend,
            prompt: &prompt,
            params: JUDGE_PARAMS,
        }) {
            Ok(raw) => raw,
            Err(e) => return Comparison::inconclusive(format!("judge call failed: {}", e)),
        };

        crate::trace_time!(start, "judge", model = model);

        let verdict = match self.parser.parse(strip_code_fence(&raw)) {
            Ok(verdict) => verdict,
            Err(e) => {
                return Comparison::inconclusive(format!(
                    "judge verdict is not structured ({}): {}",
                    e,
                    raw.trim()
                ))
            }
        };

        match verdict.get("pass") {
            Some(pass) => Comparison::from_bool(is_truthy(pass)).with_extra(verdict),
            None => Comparison::inconclusive(format!(
                "judge verdict has no `pass` field: {}",
                raw.trim()
            )),
        }
    }
}

/// Fill the grading template with the output and a bullet list of conditions
pub fn render_grading_prompt(
    output: &str,
    conditions: &[String],
) -> crate::error::Result<String> {
    let template = PromptTemplate::new(
        GRADING_TEMPLATE,
        &["input_text".to_string(), "conditions".to_string()],
    )?;

    let conditions = conditions
        .iter()
        .map(|c| format!("- {}", c))
        .collect::<Vec<_>>()
        .join("\n");

    let mut variables = Variables::new();
    variables.insert("input_text".into(), output.into());
    variables.insert("conditions".into(), conditions.into());

    template.render(&variables)
}
