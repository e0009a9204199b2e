//! Axum route handlers for the assessment API.

use axum::{extract::State, Json};

use crate::assessment::evaluation::evaluate_answers;
use crate::assessment::models::{EvaluationPayload, Evaluation, QuestionRequest, QuestionSet};
use crate::assessment::questions::generate_questions;
use crate::errors::AppError;
use crate::routes::json::ApiJson;
use crate::state::AppState;

/// POST /generate-questions
///
/// Returns exactly four questions for the given business field.
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<QuestionRequest>,
) -> Result<Json<QuestionSet>, AppError> {
    let field = request.validated_field()?;

    let set = generate_questions(field, state.llm.as_ref(), state.question_interpreter.as_ref())
        .await?;

    Ok(Json(set))
}

/// POST /evaluate-answers
///
/// Scores four answers. Input is validated before any provider call.
pub async fn handle_evaluate_answers(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<EvaluationPayload>,
) -> Result<Json<Evaluation>, AppError> {
    let request = payload.validate()?;

    let evaluation = evaluate_answers(&request, state.llm.as_ref()).await?;

    Ok(Json(evaluation))
}
