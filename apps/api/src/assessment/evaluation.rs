//! Answer evaluation: strict JSON reply, shape-checked before it leaves the server.

use tracing::info;

use crate::assessment::interpreter::parse_json_object;
use crate::assessment::models::{Evaluation, EvaluationRequest};
use crate::assessment::prompts::build_evaluation_prompt;
use crate::errors::{AppError, Operation};
use crate::llm_client::TextGenerator;

pub async fn evaluate_answers(
    request: &EvaluationRequest,
    llm: &dyn TextGenerator,
) -> Result<Evaluation, AppError> {
    let prompt = build_evaluation_prompt(&request.field, &request.answers);

    let text = llm
        .generate_content(&prompt)
        .await
        .map_err(|e| AppError::call(Operation::EvaluateAnswers, e))?;

    let evaluation: Evaluation = parse_json_object(&text)
        .map_err(|e| AppError::format(Operation::EvaluateAnswers, e))?;

    evaluation
        .validate()
        .map_err(|e| AppError::format(Operation::EvaluateAnswers, e))?;

    info!(
        field = %request.field,
        final_rating = evaluation.final_rating,
        "Evaluated answers"
    );
    Ok(evaluation)
}
