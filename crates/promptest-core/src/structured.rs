//! Structured-data parsing used by structural comparison and judge verdicts.

use serde_yaml::Value;

/// Parses text into a structured value.
///
/// Comparison and judging only depend on this capability, not on a format.
pub trait StructuredParser {
    fn parse(&self, text: &str) -> Result<Value, String>;
}

/// YAML parser; also accepts JSON since JSON is a YAML subset.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl StructuredParser for YamlParser {
    fn parse(&self, text: &str) -> Result<Value, String> {
        serde_yaml::from_str::<Value>(text).map_err(|e| e.to_string())
    }
}

/// Truthiness of a parsed value: false for null, `false`, zero and empty
/// strings/sequences/mappings.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

/// Strip a surrounding Markdown code fence (```yaml ... ```), if any.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "yaml") on the opening line
    match body.split_once('\n') {
        Some((_, inner)) => inner.trim(),
        None => body.trim(),
    }
}
