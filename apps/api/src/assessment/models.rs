//! Wire types for the assessment endpoints, shared by the server and the
//! terminal client so both sides agree on a single shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assessment::interpreter::InterpretError;
use crate::errors::AppError;

/// Questions per assessment, and therefore answers, scores and feedback.
pub const QUESTION_COUNT: usize = 4;
pub const MAX_SCORE: f64 = 10.0;
pub const ROADMAP_MIN_STEPS: usize = 3;
pub const ROADMAP_MAX_STEPS: usize = 5;

pub const FIELD_REQUIRED: &str = "Business field is required";
pub const ANSWERS_REQUIRED: &str = "Exactly 4 answers are required";

/// POST /generate-questions body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRequest {
    /// Missing and `null` both read as blank.
    #[serde(default)]
    pub field: Option<String>,
}

impl QuestionRequest {
    /// The trimmed field, or a 400 when blank.
    pub fn validated_field(&self) -> Result<&str, AppError> {
        non_blank_field(self.field.as_deref().unwrap_or_default())
    }
}

/// Four questions for one field. Regenerated on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub questions: Vec<String>,
}

/// POST /evaluate-answers body as received. `answers` stays untyped until
/// validated so every wrong shape maps to the same 400.
#[derive(Debug, Deserialize)]
pub struct EvaluationPayload {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub answers: Option<Value>,
}

/// A validated evaluation request. This is also what the client sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub field: String,
    pub answers: [String; QUESTION_COUNT],
}

impl EvaluationPayload {
    pub fn validate(self) -> Result<EvaluationRequest, AppError> {
        let answers = match self.answers {
            Some(Value::Array(items)) if items.len() == QUESTION_COUNT => items,
            _ => return Err(AppError::Validation(ANSWERS_REQUIRED.to_string())),
        };

        let answers: Vec<String> = answers
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(AppError::Validation(ANSWERS_REQUIRED.to_string())),
            })
            .collect::<Result<_, _>>()?;

        let answers: [String; QUESTION_COUNT] = answers
            .try_into()
            .map_err(|_| AppError::Validation(ANSWERS_REQUIRED.to_string()))?;

        let field = non_blank_field(self.field.as_deref().unwrap_or_default())?.to_string();

        Ok(EvaluationRequest { field, answers })
    }
}

/// Scored evaluation. `scores[i]`, `feedback[i]` and answer `i` line up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub scores: Vec<f64>,
    pub feedback: Vec<String>,
    pub final_rating: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roadmap: Option<Vec<String>>,
}

impl Evaluation {
    /// Checks the shape the prompt asked for. The model output is not
    /// trusted until this passes.
    pub fn validate(&self) -> Result<(), InterpretError> {
        if self.scores.len() != QUESTION_COUNT {
            return Err(shape(format!(
                "expected {QUESTION_COUNT} scores, got {}",
                self.scores.len()
            )));
        }
        if self.feedback.len() != QUESTION_COUNT {
            return Err(shape(format!(
                "expected {QUESTION_COUNT} feedback entries, got {}",
                self.feedback.len()
            )));
        }
        for (i, score) in self.scores.iter().enumerate() {
            if !in_score_range(*score) {
                return Err(shape(format!("score {} out of range: {score}", i + 1)));
            }
        }
        if let Some(i) = self.feedback.iter().position(|f| f.trim().is_empty()) {
            return Err(shape(format!("feedback {} is empty", i + 1)));
        }
        if !in_score_range(self.final_rating) {
            return Err(shape(format!(
                "final_rating out of range: {}",
                self.final_rating
            )));
        }
        if let Some(roadmap) = &self.roadmap {
            if !(ROADMAP_MIN_STEPS..=ROADMAP_MAX_STEPS).contains(&roadmap.len()) {
                return Err(shape(format!(
                    "expected {ROADMAP_MIN_STEPS}-{ROADMAP_MAX_STEPS} roadmap steps, got {}",
                    roadmap.len()
                )));
            }
            if roadmap.iter().any(|step| step.trim().is_empty()) {
                return Err(shape("roadmap contains an empty step".to_string()));
            }
        }
        Ok(())
    }
}

fn in_score_range(score: f64) -> bool {
    score.is_finite() && (0.0..=MAX_SCORE).contains(&score)
}

fn shape(message: String) -> InterpretError {
    InterpretError::Shape(message)
}

fn non_blank_field(field: &str) -> Result<&str, AppError> {
    let field = field.trim();
    if field.is_empty() {
        return Err(AppError::Validation(FIELD_REQUIRED.to_string()));
    }
    Ok(field)
}
