//! Output comparison.
//!
//! Every comparison resolves to a [`Comparison`]; nothing here returns an
//! error. [`Verdict::Inconclusive`] marks cases the harness could not judge
//! (bad expectation, unknown type, judge failure) so they are not confused
//! with a model getting the answer wrong.

pub mod judge;


use regex::Regex;
use serde_yaml::Value;

use crate::backend::ModelClient;
use crate::structured::{StructuredParser, YamlParser};
use crate::suite::ExpectedOutput;

pub use judge::Judge;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
    Inconclusive(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub verdict: Verdict,
    /// Parsed judge verdict, for model-graded comparisons only
    pub extra: Option<Value>,
}

impl Comparison {
    pub fn pass() -> Self {
        Self {
            verdict: Verdict::Pass,
            extra: None,
        }
    }

    pub fn fail() -> Self {
        Self {
            verdict: Verdict::Fail,
            extra: None,
        }
    }

    pub fn inconclusive(reason: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Inconclusive(reason.into()),
            extra: None,
        }
    }

    fn from_bool(passed: bool) -> Self {
        if passed {
            Self::pass()
        } else {
            Self::fail()
        }
    }

    fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    pub fn is_inconclusive(&self) -> bool {
        matches!(self.verdict, Verdict::Inconclusive(_))
    }
}

/// Checks outputs against expectations; owns the judge for model grading.
pub struct Comparator<'c, P = YamlParser> {
    parser: P,
    judge: Judge<'c, P>,
}

impl<'c> Comparator<'c> {
    pub fn new(client: &'c dyn ModelClient) -> Self {
        Self::with_parser(client, YamlParser)
    }
}

impl<'c, P: StructuredParser + Clone> Comparator<'c, P> {
    pub fn with_parser(client: &'c dyn ModelClient, parser: P) -> Self {
        Self {
            judge: Judge::new(client, parser.clone()),
            parser,
        }
    }

    /// Compare an already-trimmed `output` against `expected`
    pub fn compare(&self, output: &str, expected: &ExpectedOutput) -> Comparison {
        match expected {
            ExpectedOutput::Regex { pattern } => compare_regex(output, pattern),
            ExpectedOutput::Literal { value } => Comparison::from_bool(output == value.as_str()),
            ExpectedOutput::Structured { text } => {
                compare_structured(&self.parser, output, text)
            }
            ExpectedOutput::ModelJudged { model, conditions } => {
                self.judge.grade(model, output, conditions)
            }
            ExpectedOutput::Unsupported { kind } => {
                Comparison::inconclusive(format!("unknown comparison type {:?}", kind))
            }
        }
    }
}

/// Pass iff `pattern` matches at the start of `output` (not necessarily all of it)
pub fn compare_regex(output: &str, pattern: &str) -> Comparison {
    match Regex::new(&format!(r"\A(?:{})", pattern)) {
        Ok(re) => Comparison::from_bool(re.is_match(output)),
        Err(e) => Comparison::inconclusive(format!("invalid regex {:?}: {}", pattern, e)),
    }
}

/// Pass iff both sides parse and the parsed structures are equal.
///
/// Unparsable output fails; an unparsable expectation is inconclusive.
pub fn compare_structured<P: StructuredParser>(
    parser: &P,
    output: &str,
    expected: &str,
) -> Comparison {
    let expected = match parser.parse(expected) {
        Ok(value) => value,
        Err(e) => {
            return Comparison::inconclusive(format!("expected value is not structured: {}", e))
        }
    };

    match parser.parse(output) {
        Ok(actual) => Comparison::from_bool(actual == expected),
        Err(e) => {
            tracing::debug!(error = %e, "output is not structured");
            Comparison::fail()
        }
    }
}
