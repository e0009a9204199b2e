//! Question generation: one provider call, read through the configured interpreter.

use tracing::info;

use crate::assessment::interpreter::ResponseInterpreter;
use crate::assessment::models::QuestionSet;
use crate::assessment::prompts::build_questions_prompt;
use crate::errors::{AppError, Operation};
use crate::llm_client::TextGenerator;

/// Asks the model for four questions about `field`. `field` must already be validated.
pub async fn generate_questions(
    field: &str,
    llm: &dyn TextGenerator,
    interpreter: &dyn ResponseInterpreter,
) -> Result<QuestionSet, AppError> {
    let prompt = build_questions_prompt(field, interpreter);

    let text = llm
        .generate_content(&prompt)
        .await
        .map_err(|e| AppError::call(Operation::GenerateQuestions, e))?;

    let questions = interpreter
        .questions(&text)
        .map_err(|e| AppError::format(Operation::GenerateQuestions, e))?;

    info!(field, interpreter = interpreter.name(), "Generated questions");
    Ok(QuestionSet { questions })
}
