// All LLM prompt constants for the assessment module.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::assessment::interpreter::ResponseInterpreter;
use crate::assessment::models::QUESTION_COUNT;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;

/// Question generation prompt template.
/// Replace: {field}, {format_instructions}
pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"You are an AI assistant. Generate 4 insightful and specific questions for a business owner in the field of "{field}".
Focus on important areas such as strategy, marketing, finance, customer retention, or operations.
Each question must stand on its own and be answerable in a few sentences.

{format_instructions}"#;

/// Output format paragraph for the JSON-object question interpreter.
pub const QUESTIONS_JSON_FORMAT: &str = r#"Return only the questions in a JSON object like:
{
  "questions": ["Question 1", "Question 2", "Question 3", "Question 4"]
}"#;

/// Output format paragraph for the line-split question interpreter.
pub const QUESTIONS_LINES_FORMAT: &str = "Return exactly 4 questions, one question per line.";

/// Answer evaluation prompt template.
/// Replace: {field}, {answers}, {json_only}
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"You are an AI business evaluator. Assess the following 4 answers from someone building a business in the field of "{field}".
For each answer, provide:
- A score out of 10
- Short, actionable feedback

Also provide:
- A final overall rating (out of 10)
- A step-by-step roadmap with 3 to 5 action items to improve or grow the business.

Answers:
{answers}

{json_only}
Use this exact format, with scores and feedback in the same order as the answers:
{
  "scores": [score1, score2, score3, score4],
  "feedback": ["feedback1", "feedback2", "feedback3", "feedback4"],
  "final_rating": overall_score,
  "roadmap": ["Step 1...", "Step 2...", "Step 3...", "Step 4..."]
}"#;

/// Builds the question prompt. The output-format paragraph comes from the
/// interpreter that will read the answer.
pub fn build_questions_prompt(field: &str, interpreter: &dyn ResponseInterpreter) -> String {
    QUESTIONS_PROMPT_TEMPLATE
        .replace("{format_instructions}", &interpreter.format_instructions())
        .replace("{field}", &sanitize_field(field))
}

pub fn build_evaluation_prompt(field: &str, answers: &[String; QUESTION_COUNT]) -> String {
    let answers = answers
        .iter()
        .enumerate()
        .map(|(i, answer)| format!("Q{}: {}", i + 1, answer.trim()))
        .collect::<Vec<_>>()
        .join("\n");

    EVALUATION_PROMPT_TEMPLATE
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
        .replace("{field}", &sanitize_field(field))
        .replace("{answers}", &answers)
}

/// The field is quoted inside the prompt: keep it on one line and free of
/// double quotes so it cannot close the quotation early. Braces are dropped
/// so the field cannot name a `{placeholder}` that is substituted after it.
fn sanitize_field(field: &str) -> String {
    field
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('"', "'")
        .replace(['{', '}'], "")
}
