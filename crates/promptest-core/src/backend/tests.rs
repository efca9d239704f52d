//! Tests for backend classification and invocation.

use super::testing::ScriptedClient;
use super::*;
use crate::prompt::PromptSpec;
use serde_yaml::Value;

const PARAMS: GenerationParams = GenerationParams {
    temperature: 0.3,
    max_tokens: 40,
};

fn prompt(template: &str, vars: &[&str]) -> PromptSpec {
    PromptSpec {
        template: template.to_string(),
        input_variables: vars.iter().map(|s| s.to_string()).collect(),
        output_key: "text".to_string(),
    }
}

fn variables(pairs: &[(&str, &str)]) -> Variables {
    pairs
        .iter()
        .map(|(k, v)| (Value::String(k.to_string()), Value::String(v.to_string())))
        .collect()
}

#[test]
fn test_classify_hosted_models() {
    assert_eq!(Backend::classify("gpt-3.5-turbo").unwrap(), Backend::Chat);
    assert_eq!(Backend::classify("gpt-4").unwrap(), Backend::Chat);
    assert_eq!(
        Backend::classify("text-davinci-003").unwrap(),
        Backend::Completion
    );
}

#[test]
fn test_classify_local_paths() {
    assert_eq!(
        Backend::classify("/models/llama-7b.gguf").unwrap(),
        Backend::Local(PathBuf::from("/models/llama-7b.gguf"))
    );
    assert_eq!(
        Backend::classify("./ggml-model.bin").unwrap(),
        Backend::Local(PathBuf::from("./ggml-model.bin"))
    );
    assert_eq!(
        Backend::classify("../shared/model.bin").unwrap().kind(),
        "local"
    );
}

#[test]
fn test_classify_invalid_name() {
    let err = Backend::classify("llama-7b").unwrap_err();
    assert!(matches!(err, PromptestError::InvalidModel { ref name } if name == "llama-7b"));
    assert!(err.to_string().contains("local model"));

    // A bare relative file name is not treated as a path
    assert!(Backend::classify("model.gguf").is_err());
}

#[test]
fn test_extract_answer() {
    assert_eq!(extract_answer("Question: X\nAnswer:  42 "), "42");
    assert_eq!(extract_answer("no marker here"), "");
    assert_eq!(extract_answer("Answer:"), "");
    assert_eq!(
        extract_answer("Question: a\nAnswer: first Answer: second"),
        "first Answer: second"
    );
}

#[test]
fn test_invoke_chat_trims_output() {
    let client = ScriptedClient::constant("  Hello, Ada!\n");
    let invoker = Invoker::build(
        "gpt-3.5-turbo",
        &prompt("Say hello to {name}", &["name"]),
        PARAMS,
        &client,
    )
    .unwrap();

    let output = invoker.invoke(&variables(&[("name", "Ada")])).unwrap();
    assert_eq!(output, "Hello, Ada!");

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].prompt, "Say hello to Ada");
    assert_eq!(calls[0].backend, Backend::Chat);
    assert_eq!(calls[0].params, PARAMS);
}

#[test]
fn test_invoke_local_wraps_and_extracts() {
    let client = ScriptedClient::new(|req| Ok(format!("{}  42 \n", req.prompt)));
    let invoker = Invoker::build(
        "./models/tiny.gguf",
        &prompt("What is {a} times {b}?", &["a", "b"]),
        PARAMS,
        &client,
    )
    .unwrap();

    let output = invoker
        .invoke(&variables(&[("a", "6"), ("b", "7")]))
        .unwrap();
    assert_eq!(output, "42");
    assert_eq!(client.calls()[0].prompt, "Question: What is 6 times 7?\nAnswer:");
    assert_eq!(invoker.backend().kind(), "local");
}

#[test]
fn test_invoke_local_skips_markers_in_echoed_prompt() {
    let client = ScriptedClient::new(|req| Ok(format!("{} Paris\n", req.prompt)));
    let invoker = Invoker::build(
        "./models/tiny.gguf",
        &prompt(
            "Capital of Italy?\nAnswer: Rome\nCapital of {country}?",
            &["country"],
        ),
        PARAMS,
        &client,
    )
    .unwrap();

    let output = invoker
        .invoke(&variables(&[("country", "France")]))
        .unwrap();
    assert_eq!(output, "Paris");
}

#[test]
fn test_invoke_local_without_marker_is_empty() {
    let client = ScriptedClient::constant("I refuse to follow the format");
    let invoker = Invoker::build("/models/m.bin", &prompt("Hi", &[]), PARAMS, &client).unwrap();

    assert_eq!(invoker.invoke(&Variables::new()).unwrap(), "");
}

#[test]
fn test_build_rejects_invalid_model_before_any_call() {
    let client = ScriptedClient::constant("unused");
    let err = Invoker::build("claude-instant", &prompt("Hi", &[]), PARAMS, &client).unwrap_err();

    assert!(matches!(err, PromptestError::InvalidModel { .. }));
    assert!(client.calls().is_empty());
}

#[test]
fn test_invoke_propagates_client_fault() {
    let client = ScriptedClient::new(|req| Err(PromptestError::model_call(req.model, "boom")));
    let invoker = Invoker::build("gpt-4", &prompt("Hi", &[]), PARAMS, &client).unwrap();

    let err = invoker.invoke(&Variables::new()).unwrap_err();
    assert!(err.to_string().contains("boom"));
}

#[test]
fn test_invoke_missing_variable_does_not_call_model() {
    let client = ScriptedClient::constant("unused");
    let invoker = Invoker::build(
        "gpt-4",
        &prompt("Hi {name}", &["name"]),
        PARAMS,
        &client,
    )
    .unwrap();

    assert!(invoker.invoke(&Variables::new()).is_err());
    assert!(client.calls().is_empty());
}
