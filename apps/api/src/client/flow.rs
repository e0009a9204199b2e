//! Assessment flow: the client's state machine.
//!
//! ```text
//! Idle ──submit_field──▶ Generating ──ok──▶ QuestionsReady ──submit_answers──▶ Evaluating ──ok──▶ Evaluated
//!   ▲                        │                   ▲                                 │
//!   └────────── err ─────────┘                   └─────────────── err ─────────────┘
//! ```
//!
//! Failures from the API are stored as `error` (what the user sees), not
//! returned. `FlowError` is reserved for calls the UI should not have made,
//! e.g. submitting while the submit control is disabled.

use thiserror::Error;
use tracing::{info, warn};

use crate::assessment::models::{Evaluation, EvaluationRequest, QUESTION_COUNT};
use crate::client::api::AssessmentApi;
use crate::client::backend::HistoryStore;
use crate::client::session::SessionContext;
use crate::models::history::NewHistoryRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Generating,
    QuestionsReady,
    Evaluating,
    Evaluated,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("submit is disabled in the current state")]
    SubmitDisabled,

    #[error("answer index {index} out of range")]
    AnswerIndex { index: usize },

    #[error("no questions to answer yet")]
    NoQuestions,
}

/// Where a successful evaluation gets recorded. Both halves are passed in
/// explicitly; the flow never looks up auth state on its own.
#[derive(Clone, Copy)]
pub struct HistorySink<'a> {
    pub session: &'a SessionContext,
    pub store: &'a dyn HistoryStore,
}

#[derive(Debug, Clone)]
pub struct Flow {
    phase: Phase,
    field: String,
    questions: Vec<String>,
    answers: Vec<String>,
    evaluation: Option<Evaluation>,
    error: Option<String>,
}

impl Default for Flow {
    fn default() -> Self {
        Self::new()
    }
}

impl Flow {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            field: String::new(),
            questions: Vec::new(),
            answers: vec![String::new(); QUESTION_COUNT],
            evaluation: None,
            error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True while a request is in flight. Gates both submit controls.
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Generating | Phase::Evaluating)
    }

    pub fn set_field(&mut self, field: impl Into<String>) {
        self.field = field.into();
    }

    pub fn can_generate(&self) -> bool {
        !self.field.trim().is_empty() && !self.is_loading()
    }

    /// Requests a fresh question set for the current field.
    pub async fn submit_field(&mut self, api: &dyn AssessmentApi) -> Result<(), FlowError> {
        if !self.can_generate() {
            return Err(FlowError::SubmitDisabled);
        }

        self.phase = Phase::Generating;
        self.error = None;
        self.questions.clear();
        self.evaluation = None;

        match api.generate_questions(self.field.trim()).await {
            Ok(set) => {
                self.questions = set.questions;
                self.answers = vec![String::new(); QUESTION_COUNT];
                self.phase = Phase::QuestionsReady;
            }
            Err(e) => {
                warn!("Question request failed: {e}");
                self.error = Some(e.to_string());
                self.phase = Phase::Idle;
            }
        }
        Ok(())
    }

    /// Local edit. No state transition.
    pub fn edit_answer(&mut self, index: usize, text: impl Into<String>) -> Result<(), FlowError> {
        if self.questions.is_empty() {
            return Err(FlowError::NoQuestions);
        }
        let slot = self
            .answers
            .get_mut(index)
            .ok_or(FlowError::AnswerIndex { index })?;
        *slot = text.into();
        Ok(())
    }

    pub fn can_evaluate(&self) -> bool {
        matches!(self.phase, Phase::QuestionsReady | Phase::Evaluated)
            && self.questions.len() == QUESTION_COUNT
            && self.answers.iter().all(|a| !a.trim().is_empty())
    }

    /// Requests an evaluation of the current answers. On success, and when a
    /// user is signed in, also records the result through `history`; a failed
    /// insert is logged and otherwise ignored.
    pub async fn submit_answers(
        &mut self,
        api: &dyn AssessmentApi,
        history: Option<HistorySink<'_>>,
    ) -> Result<(), FlowError> {
        if !self.can_evaluate() {
            return Err(FlowError::SubmitDisabled);
        }
        let request = self.evaluation_request()?;

        self.phase = Phase::Evaluating;
        self.error = None;
        self.evaluation = None;

        let evaluation = match api.evaluate_answers(&request).await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                warn!("Evaluation request failed: {e}");
                self.error = Some(e.to_string());
                self.phase = Phase::QuestionsReady;
                return Ok(());
            }
        };

        if let Some(sink) = history {
            self.record_history(sink, &request, &evaluation).await;
        }

        self.evaluation = Some(evaluation);
        self.phase = Phase::Evaluated;
        Ok(())
    }

    fn evaluation_request(&self) -> Result<EvaluationRequest, FlowError> {
        let answers: [String; QUESTION_COUNT] = self
            .answers
            .clone()
            .try_into()
            .map_err(|_| FlowError::NoQuestions)?;
        Ok(EvaluationRequest {
            field: self.field.trim().to_string(),
            answers,
        })
    }

    async fn record_history(
        &self,
        sink: HistorySink<'_>,
        request: &EvaluationRequest,
        evaluation: &Evaluation,
    ) {
        let Some(session) = sink.session.current() else {
            return;
        };
        let record = NewHistoryRecord::new(session.user.id, &self.questions, request, evaluation);
        match sink.store.insert_history(&session, &record).await {
            Ok(()) => info!(user_id = %session.user.id, "Saved evaluation to history"),
            Err(e) => warn!(user_id = %session.user.id, "Failed to save evaluation to history: {e}"),
        }
    }
}
