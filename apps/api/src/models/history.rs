use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assessment::models::{Evaluation, EvaluationRequest};

/// Row written to the hosted `user_history` table after a successful
/// evaluation. `created_at` is assigned by the service.
///
/// `scores` and `feedback` need their own `jsonb` columns (see
/// `config::HISTORY_TABLE_COLUMNS`). They are left out of the insert when empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewHistoryRecord {
    pub user_id: Uuid,
    pub field: String,
    pub questions: Vec<String>,
    pub answers: Vec<String>,
    /// Final rating.
    pub score: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scores: Vec<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub feedback: Vec<String>,
    pub roadmap: Option<Vec<String>>,
}

impl NewHistoryRecord {
    pub fn new(
        user_id: Uuid,
        questions: &[String],
        request: &EvaluationRequest,
        evaluation: &Evaluation,
    ) -> Self {
        Self {
            user_id,
            field: request.field.clone(),
            questions: questions.to_vec(),
            answers: request.answers.to_vec(),
            score: evaluation.final_rating,
            scores: evaluation.scores.clone(),
            feedback: evaluation.feedback.clone(),
            roadmap: evaluation.roadmap.clone(),
        }
    }
}

/// Row read back from `user_history`. Older rows may lack the per-question
/// columns, so those default to empty.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryRecord {
    pub user_id: Uuid,
    pub field: String,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub answers: Vec<String>,
    pub score: Option<f64>,
    #[serde(default)]
    pub scores: Vec<f64>,
    #[serde(default)]
    pub feedback: Vec<String>,
    #[serde(default)]
    pub roadmap: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}
