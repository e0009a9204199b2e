use std::sync::Arc;

use crate::assessment::interpreter::ResponseInterpreter;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
/// Immutable after startup; requests never coordinate through it.
#[derive(Clone)]
pub struct AppState {
    /// Generative model. Default: GeminiClient.
    pub llm: Arc<dyn TextGenerator>,
    /// How question replies are read. Swap via QUESTION_PARSE_MODE.
    pub question_interpreter: Arc<dyn ResponseInterpreter>,
}
