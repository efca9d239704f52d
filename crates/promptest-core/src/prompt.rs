//! Prompt files and `{name}` placeholder templates.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{PromptestError, Result};
use crate::{bail_invalid, bail_template};

/// Substitution values for one test case, in declaration order
pub type Variables = serde_yaml::Mapping;

/// Contents of a prompt file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSpec {
    pub template: String,
    pub input_variables: Vec<String>,
    pub output_key: String,
}

impl PromptSpec {
    /// Load a prompt file
    pub fn load(path: &Path) -> Result<Self> {
        load_yaml(path, "prompt")
    }
}

/// Read and deserialize an input document, mapping failures to data errors.
pub(crate) fn load_yaml<T>(path: &Path, kind: &str) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PromptestError::InputNotFound {
            kind: kind.to_string(),
            path: path.to_path_buf(),
        },
        _ => PromptestError::io_operation("read", path.display(), e),
    })?;

    serde_yaml::from_str(&content).map_err(|e| PromptestError::InvalidInput {
        kind: kind.to_string(),
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Var(String),
}

/// A parsed template whose placeholders match its declared variables.
///
/// `{{` and `}}` render as literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn new(template: &str, input_variables: &[String]) -> Result<Self> {
        let segments = parse_segments(template)?;

        let used: BTreeSet<&str> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Var(name) => Some(name.as_str()),
                Segment::Text(_) => None,
            })
            .collect();
        let declared: BTreeSet<&str> = input_variables.iter().map(String::as_str).collect();

        if let Some(name) = used.difference(&declared).next() {
            bail_template!(*name, "used in the template but not declared in input_variables");
        }
        if let Some(name) = declared.difference(&used).next() {
            bail_template!(*name, "declared in input_variables but not used in the template");
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// Substitute every placeholder. Undeclared extra variables are ignored.
    pub fn render(&self, variables: &Variables) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Var(name) => match variables.get(name.as_str()) {
                    Some(value) => out.push_str(&value_text(value)),
                    None => bail_template!(name.as_str(), "missing from the test case variables"),
                },
            }
        }
        Ok(out)
    }
}

/// Text used when a variable value is substituted into a prompt
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn parse_segments(template: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                text.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                text.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                let name = name.trim();
                if !closed {
                    bail_invalid!("prompt template", "unclosed '{' in template");
                }
                if name.is_empty() || name.contains('{') {
                    bail_invalid!("prompt template", format!("bad placeholder {{{}}}", name));
                }
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Var(name.to_string()));
            }
            '}' => bail_invalid!("prompt template", "single '}' encountered in template"),
            _ => text.push(c),
        }
    }

    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}
