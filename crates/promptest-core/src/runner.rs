//! Runs every configured model over every test case, in declared order.

use serde::Serialize;
use serde_yaml::Value;
use std::time::Instant;

use crate::backend::{Invoker, ModelClient};
use crate::compare::{Comparator, Comparison, Verdict};
use crate::error::Result;
use crate::prompt::{PromptSpec, Variables};
use crate::suite::{RunConfig, TestCase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Pass,
    Fail,
    Inconclusive,
}

/// Result of one test case for one model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestOutcome {
    pub inputs: Variables,
    pub output: String,
    pub comparison_result: bool,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<Value>,
}

impl TestOutcome {
    fn new(inputs: &Variables, output: String, comparison: Comparison) -> Self {
        let (status, error) = match comparison.verdict {
            Verdict::Pass => (OutcomeStatus::Pass, None),
            Verdict::Fail => (OutcomeStatus::Fail, None),
            Verdict::Inconclusive(reason) => (OutcomeStatus::Inconclusive, Some(reason)),
        };

        Self {
            inputs: inputs.clone(),
            output,
            comparison_result: status == OutcomeStatus::Pass,
            status,
            error,
            extra_data: comparison.extra,
        }
    }
}

/// All outcomes of one model in one run
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRunSummary {
    pub model: String,
    pub results: Vec<TestOutcome>,
    pub passes: usize,
    pub inconclusive: usize,
    pub total: usize,
}

impl ModelRunSummary {
    fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            results: Vec::new(),
            passes: 0,
            inconclusive: 0,
            total: 0,
        }
    }

    fn record(&mut self, outcome: TestOutcome) {
        self.total += 1;
        match outcome.status {
            OutcomeStatus::Pass => self.passes += 1,
            OutcomeStatus::Inconclusive => self.inconclusive += 1,
            OutcomeStatus::Fail => {}
        }
        self.results.push(outcome);
    }

    pub fn failures(&self) -> usize {
        self.total - self.passes - self.inconclusive
    }

    /// Pass ratio, 0.0 when there were no test cases
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passes as f64 / self.total as f64
        }
    }
}

pub struct Runner<'c> {
    prompt: &'c PromptSpec,
    config: &'c RunConfig,
    client: &'c dyn ModelClient,
}

impl<'c> Runner<'c> {
    pub fn new(
        prompt: &'c PromptSpec,
        config: &'c RunConfig,
        client: &'c dyn ModelClient,
    ) -> Self {
        Self {
            prompt,
            config,
            client,
        }
    }

    /// Evaluate every model on `tests`.
    ///
    /// All invokers are built first, so an invalid model name aborts the run
    /// before any model is called. Per-case faults become inconclusive
    /// outcomes and never abort the run.
    pub fn run(&self, tests: &[TestCase]) -> Result<Vec<ModelRunSummary>> {
        let invokers = self
            .config
            .model_names
            .iter()
            .map(|name| Invoker::build(name, self.prompt, self.config.params(), self.client))
            .collect::<Result<Vec<_>>>()?;

        let comparator = Comparator::new(self.client);

        Ok(invokers
            .iter()
            .map(|invoker| run_model(invoker, &comparator, tests))
            .collect())
    }
}

fn run_model(
    invoker: &Invoker<'_>,
    comparator: &Comparator<'_>,
    tests: &[TestCase],
) -> ModelRunSummary {
    let start = Instant::now();
    let mut summary = ModelRunSummary::new(invoker.model());

    for (index, case) in tests.iter().enumerate() {
        let outcome = match invoker.invoke(&case.variables) {
            Ok(output) => {
                let comparison = comparator.compare(&output, &case.expected_output);
                TestOutcome::new(&case.variables, output, comparison)
            }
            Err(e) => TestOutcome::new(
                &case.variables,
                String::new(),
                Comparison::inconclusive(e.to_string()),
            ),
        };

        tracing::debug!(
            model = invoker.model(),
            case = index,
            kind = case.expected_output.kind(),
            status = ?outcome.status,
            "test_case"
        );
        if let Some(error) = &outcome.error {
            tracing::warn!(model = invoker.model(), case = index, %error, "inconclusive");
        }

        summary.record(outcome);
    }

    tracing::info!(
        model = invoker.model(),
        backend = invoker.backend().kind(),
        passes = summary.passes,
        inconclusive = summary.inconclusive,
        total = summary.total,
        elapsed = ?start.elapsed(),
        "model_complete"
    );

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::ScriptedClient;
    use crate::backend::Backend;
    use crate::error::PromptestError;
    use crate::suite::ExpectedOutput;

    fn prompt() -> PromptSpec {
        PromptSpec {
            template: "Say hello to {name}".to_string(),
            input_variables: vec!["name".to_string()],
            output_key: "greeting".to_string(),
        }
    }

    fn config(models: &[&str]) -> RunConfig {
        RunConfig {
            model_names: models.iter().map(|m| m.to_string()).collect(),
            temperature: 0.0,
            max_tokens: 32,
        }
    }

    fn case(name: &str, expected: ExpectedOutput) -> TestCase {
        let mut variables = Variables::new();
        variables.insert("name".into(), name.into());
        TestCase {
            variables,
            expected_output: expected,
        }
    }

    fn literal(value: &str) -> ExpectedOutput {
        ExpectedOutput::Literal {
            value: value.to_string(),
        }
    }

    /// Echoes "Hello, <name>!" by reading the rendered prompt
    fn echo_client() -> ScriptedClient {
        ScriptedClient::new(|req| {
            let name = req.prompt.trim_start_matches("Say hello to ");
            Ok(format!("Hello, {}!\n", name))
        })
    }

    #[test]
    fn test_end_to_end_single_case() {
        let prompt = prompt();
        let config = config(&["gpt-3.5-turbo"]);
        let client = echo_client();

        let summaries = Runner::new(&prompt, &config, &client)
            .run(&[case("Ada", literal("Hello, Ada!"))])
            .unwrap();

        assert_eq!(summaries.len(), 1);
        let summary = &summaries[0];
        assert_eq!(summary.model, "gpt-3.5-turbo");
        assert_eq!(summary.passes, 1);
        assert_eq!(summary.total, 1);
        assert_eq!(summary.results[0].output, "Hello, Ada!");
        assert!(summary.results[0].comparison_result);
        assert_eq!(summary.results[0].status, OutcomeStatus::Pass);
        assert_eq!(summary.results[0].extra_data, None);
    }

    #[test]
    fn test_counts_hold_for_every_model() {
        let prompt = prompt();
        let config = config(&["gpt-4", "text-davinci-003", "gpt-4"]);
        let client = echo_client();
        let tests = vec![
            case("Ada", literal("Hello, Ada!")),
            case("Bob", literal("Hi, Bob!")),
            case(
                "Cy",
                ExpectedOutput::Regex {
                    pattern: "Hello".to_string(),
                },
            ),
            case(
                "Di",
                ExpectedOutput::Unsupported {
                    kind: "unsupported".to_string(),
                },
            ),
        ];

        let summaries = Runner::new(&prompt, &config, &client).run(&tests).unwrap();

        assert_eq!(summaries.len(), 3);
        for summary in &summaries {
            assert_eq!(summary.results.len(), tests.len());
            assert_eq!(summary.total, tests.len());
            assert!(summary.passes <= summary.total);
            assert_eq!(summary.passes, 2);
            assert_eq!(summary.inconclusive, 1);
            assert_eq!(summary.failures(), 1);
        }
        assert_eq!(client.calls().len(), 12);
    }

    #[test]
    fn test_models_run_sequentially_in_declared_order() {
        let prompt = prompt();
        let config = config(&["gpt-4", "text-davinci-003"]);
        let client = echo_client();
        let tests = vec![case("A", literal("x")), case("B", literal("y"))];

        Runner::new(&prompt, &config, &client).run(&tests).unwrap();

        let order: Vec<(String, String)> = client
            .calls()
            .into_iter()
            .map(|c| (c.model, c.prompt))
            .collect();
        assert_eq!(
            order,
            vec![
                ("gpt-4".to_string(), "Say hello to A".to_string()),
                ("gpt-4".to_string(), "Say hello to B".to_string()),
                ("text-davinci-003".to_string(), "Say hello to A".to_string()),
                ("text-davinci-003".to_string(), "Say hello to B".to_string()),
            ]
        );
    }

    #[test]
    fn test_model_fault_is_isolated_to_its_case() {
        let prompt = prompt();
        let config = config(&["gpt-4", "text-davinci-003"]);
        let client = ScriptedClient::new(|req| {
            if req.model == "gpt-4" && req.prompt.ends_with("Bob") {
                Err(PromptestError::model_call(req.model, "rate limited"))
            } else {
                Ok("Hello".to_string())
            }
        });
        let tests = vec![
            case("Ada", literal("Hello")),
            case("Bob", literal("Hello")),
            case("Cy", literal("Hello")),
        ];

        let summaries = Runner::new(&prompt, &config, &client).run(&tests).unwrap();

        let flaky = &summaries[0];
        assert_eq!(flaky.total, 3);
        assert_eq!(flaky.passes, 2);
        assert_eq!(flaky.inconclusive, 1);
        assert_eq!(flaky.results[1].output, "");
        assert!(!flaky.results[1].comparison_result);
        assert!(flaky.results[1]
            .error
            .as_deref()
            .unwrap()
            .contains("rate limited"));

        let steady = &summaries[1];
        assert_eq!(steady.passes, 3);
        assert_eq!(steady.total, 3);
    }

    #[test]
    fn test_invalid_model_aborts_before_any_call() {
        let prompt = prompt();
        let config = config(&["gpt-4", "mystery-model"]);
        let client = echo_client();

        let err = Runner::new(&prompt, &config, &client)
            .run(&[case("Ada", literal("Hello, Ada!"))])
            .unwrap_err();

        assert!(matches!(err, PromptestError::InvalidModel { .. }));
        assert!(err.to_string().contains("mystery-model"));
        assert!(client.calls().is_empty());
    }

    #[test]
    fn test_model_judged_outcome_carries_verdict() {
        let prompt = prompt();
        let config = config(&["gpt-4"]);
        let client = ScriptedClient::new(|req| {
            if req.prompt.starts_with("Say hello") {
                Ok("The sky is blue.".to_string())
            } else {
                Ok("pass: true\nreasons: [color mentioned]".to_string())
            }
        });
        let tests = vec![case(
            "Ada",
            ExpectedOutput::ModelJudged {
                model: "gpt-3.5-turbo".to_string(),
                conditions: vec!["mentions a color".to_string()],
            },
        )];

        let summaries = Runner::new(&prompt, &config, &client).run(&tests).unwrap();

        let outcome = &summaries[0].results[0];
        assert!(outcome.comparison_result);
        assert_eq!(
            outcome.extra_data.as_ref().unwrap()["pass"],
            Value::Bool(true)
        );

        let calls = client.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].model, "gpt-3.5-turbo");
        assert_eq!(calls[1].backend, Backend::Chat);
        assert_eq!(calls[1].params.temperature, 0.0);
    }

    #[test]
    fn test_empty_suite_yields_zero_totals() {
        let prompt = prompt();
        let config = config(&["gpt-4"]);
        let client = echo_client();

        let summaries = Runner::new(&prompt, &config, &client).run(&[]).unwrap();
        assert_eq!(summaries[0].total, 0);
        assert_eq!(summaries[0].ratio(), 0.0);
    }
}
