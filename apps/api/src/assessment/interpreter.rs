//! Response interpretation: turns unconstrained model text into structure.
//!
//! The question endpoint reads model text through a `ResponseInterpreter`
//! chosen at startup (`QUESTION_PARSE_MODE`), so the parsing strategy can be
//! swapped without touching request handling. Every interpreter ends in the
//! same shape check: exactly `QUESTION_COUNT` non-blank questions.
//!
//! JSON extraction is greedy: the first `{` to the last `}` of
//! the text. Prose or code fences around the object are tolerated; two
//! separate objects in one reply are not.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::assessment::models::QUESTION_COUNT;
use crate::assessment::prompts::{QUESTIONS_JSON_FORMAT, QUESTIONS_LINES_FORMAT};
use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, PLAIN_LINES_INSTRUCTION};

static JSON_OBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

/// Leading list markers a model tends to add: "1.", "2)", "Q3:", "-", "*", "•".
static LIST_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+[.)]|[Qq]\d+[:.)]|[-*•])\s*").expect("valid regex")
});

#[derive(Debug, Error)]
pub enum InterpretError {
    #[error("no JSON object found in model output")]
    NoJsonObject,

    #[error("model output is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("model output has the wrong shape: {0}")]
    Shape(String),

    #[error("primary interpreter failed ({primary}); fallback failed ({fallback})")]
    Fallback {
        primary: Box<InterpretError>,
        fallback: Box<InterpretError>,
    },
}

/// Returns the greedy `{...}` span of `text`, if any.
pub fn extract_json_object(text: &str) -> Option<&str> {
    JSON_OBJECT_RE.find(text).map(|m| m.as_str())
}

/// Extracts the JSON object from model text and deserializes it.
pub fn parse_json_object<T: DeserializeOwned>(text: &str) -> Result<T, InterpretError> {
    let object = extract_json_object(text).ok_or(InterpretError::NoJsonObject)?;
    Ok(serde_json::from_str(object)?)
}

/// Reads a question set out of model text.
pub trait ResponseInterpreter: Send + Sync {
    /// Short identifier, used in logs.
    fn name(&self) -> &'static str;

    /// Output-format paragraph placed in the prompt so the model answers in
    /// the shape this interpreter reads.
    fn format_instructions(&self) -> String;

    fn questions(&self, text: &str) -> Result<Vec<String>, InterpretError>;
}

#[derive(Deserialize)]
struct QuestionsEnvelope {
    questions: Vec<String>,
}

/// Strict policy: `{"questions": [...]}` somewhere in the text.
pub struct JsonObjectInterpreter;

impl ResponseInterpreter for JsonObjectInterpreter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn format_instructions(&self) -> String {
        format!("{QUESTIONS_JSON_FORMAT}\n{JSON_ONLY_INSTRUCTION}")
    }

    fn questions(&self, text: &str) -> Result<Vec<String>, InterpretError> {
        let envelope: QuestionsEnvelope = parse_json_object(text)?;
        finalize_questions(envelope.questions)
    }
}

/// Lenient policy: one question per line, blank lines dropped.
pub struct LineSplitInterpreter;

impl ResponseInterpreter for LineSplitInterpreter {
    fn name(&self) -> &'static str {
        "lines"
    }

    fn format_instructions(&self) -> String {
        format!("{QUESTIONS_LINES_FORMAT}\n{PLAIN_LINES_INSTRUCTION}")
    }

    fn questions(&self, text: &str) -> Result<Vec<String>, InterpretError> {
        let lines = text
            .lines()
            .map(|line| LIST_MARKER_RE.replace(line.trim(), "").trim().to_string())
            .collect();
        finalize_questions(lines)
    }
}

/// Tries `primary`; only when it fails, tries `fallback`. The prompt asks for
/// the primary format.
pub struct FallbackInterpreter {
    primary: Box<dyn ResponseInterpreter>,
    fallback: Box<dyn ResponseInterpreter>,
}

impl FallbackInterpreter {
    pub fn new(
        primary: Box<dyn ResponseInterpreter>,
        fallback: Box<dyn ResponseInterpreter>,
    ) -> Self {
        Self { primary, fallback }
    }
}

impl ResponseInterpreter for FallbackInterpreter {
    fn name(&self) -> &'static str {
        "json-then-lines"
    }

    fn format_instructions(&self) -> String {
        self.primary.format_instructions()
    }

    fn questions(&self, text: &str) -> Result<Vec<String>, InterpretError> {
        match self.primary.questions(text) {
            Ok(questions) => Ok(questions),
            Err(primary) => {
                tracing::warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    "Primary interpreter failed: {primary}"
                );
                self.fallback
                    .questions(text)
                    .map_err(|fallback| InterpretError::Fallback {
                        primary: Box::new(primary),
                        fallback: Box::new(fallback),
                    })
            }
        }
    }
}

/// Trims, drops blanks, keeps the first `QUESTION_COUNT`. Fewer is an error.
fn finalize_questions(candidates: Vec<String>) -> Result<Vec<String>, InterpretError> {
    let questions: Vec<String> = candidates
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .take(QUESTION_COUNT)
        .collect();

    if questions.len() < QUESTION_COUNT {
        return Err(InterpretError::Shape(format!(
            "expected {QUESTION_COUNT} questions, got {}",
            questions.len()
        )));
    }
    Ok(questions)
}

/// Which interpreter reads question replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    #[default]
    Json,
    Lines,
    JsonThenLines,
}

impl ParseMode {
    pub fn interpreter(self) -> Arc<dyn ResponseInterpreter> {
        match self {
            ParseMode::Json => Arc::new(JsonObjectInterpreter),
            ParseMode::Lines => Arc::new(LineSplitInterpreter),
            ParseMode::JsonThenLines => Arc::new(FallbackInterpreter::new(
                Box::new(JsonObjectInterpreter),
                Box::new(LineSplitInterpreter),
            )),
        }
    }
}

impl FromStr for ParseMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ParseMode::Json),
            "lines" => Ok(ParseMode::Lines),
            "json-then-lines" => Ok(ParseMode::JsonThenLines),
            other => Err(format!(
                "unknown parse mode '{other}' (expected json, lines or json-then-lines)"
            )),
        }
    }
}

impl fmt::Display for ParseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseMode::Json => "json",
            ParseMode::Lines => "lines",
            ParseMode::JsonThenLines => "json-then-lines",
        };
        f.write_str(name)
    }
}
