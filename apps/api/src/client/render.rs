//! Plain-text views for the terminal client.

use crate::assessment::models::{Evaluation, MAX_SCORE};
use crate::models::history::HistoryRecord;

pub fn render_questions(questions: &[String]) -> String {
    let mut out = String::from("Generated Questions\n");
    for (i, question) in questions.iter().enumerate() {
        out.push_str(&format!("Q{}: {question}\n", i + 1));
    }
    out
}

/// One `Q{n}: {score}/10 - {feedback}` line per answer, the final rating,
/// then the roadmap when present.
pub fn render_evaluation(evaluation: &Evaluation) -> String {
    let mut lines = vec!["Evaluation Results".to_string()];

    for (i, (score, feedback)) in evaluation
        .scores
        .iter()
        .zip(evaluation.feedback.iter())
        .enumerate()
    {
        lines.push(format!("Q{}: {}/{MAX_SCORE} - {feedback}", i + 1, score));
    }
    lines.push(format!("Final Rating: {}/{MAX_SCORE}", evaluation.final_rating));

    if let Some(roadmap) = &evaluation.roadmap {
        lines.push("Next Steps (Roadmap)".to_string());
        lines.extend(roadmap.iter().map(|step| format!("- {step}")));
    }

    lines.join("\n")
}

pub fn render_history(records: &[HistoryRecord]) -> String {
    if records.is_empty() {
        return "No past evaluations yet.".to_string();
    }

    let mut out = String::from("Your Past Evaluations\n");
    for record in records {
        out.push('\n');
        out.push_str(&format!("Business Field: {}\n", record.field));
        out.push_str(&format!("Answers: {}\n", record.answers.join(", ")));
        if !record.scores.is_empty() {
            let scores: Vec<String> = record.scores.iter().map(|s| s.to_string()).collect();
            out.push_str(&format!("Scores: {}\n", scores.join(", ")));
        }
        match record.score {
            Some(score) => out.push_str(&format!("Rating: {score}/{MAX_SCORE}\n")),
            None => out.push_str("Rating: n/a\n"),
        }
        if !record.feedback.is_empty() {
            out.push_str("Feedback:\n");
            for item in &record.feedback {
                out.push_str(&format!("- {item}\n"));
            }
        }
        if let Some(roadmap) = record.roadmap.as_ref().filter(|r| !r.is_empty()) {
            out.push_str("Roadmap:\n");
            for step in roadmap {
                out.push_str(&format!("- {step}\n"));
            }
        }
        out.push_str(&format!(
            "Created At: {}\n",
            record.created_at.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    out
}
