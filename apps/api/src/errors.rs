use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::assessment::interpreter::InterpretError;
use crate::llm_client::LlmError;

/// The assessment operation a server-side failure happened in.
/// Selects the generic message shown to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    GenerateQuestions,
    EvaluateAnswers,
}

impl Operation {
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::GenerateQuestions => "Failed to generate questions",
            Operation::EvaluateAnswers => "Failed to evaluate answers",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::GenerateQuestions => f.write_str("question generation"),
            Operation::EvaluateAnswers => f.write_str("answer evaluation"),
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// The provider answered, but its text could not be read as the expected structure.
    #[error("Upstream format error during {operation}: {source}")]
    UpstreamFormat {
        operation: Operation,
        #[source]
        source: InterpretError,
    },

    /// The provider could not be reached or refused the request.
    #[error("Upstream call error during {operation}: {source}")]
    UpstreamCall {
        operation: Operation,
        #[source]
        source: LlmError,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn format(operation: Operation, source: InterpretError) -> Self {
        AppError::UpstreamFormat { operation, source }
    }

    pub fn call(operation: Operation, source: LlmError) -> Self {
        AppError::UpstreamCall { operation, source }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UpstreamFormat { operation, source } => {
                tracing::error!(%operation, "Upstream format error: {source}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "UPSTREAM_FORMAT_ERROR",
                    operation.failure_message().to_string(),
                )
            }
            AppError::UpstreamCall { operation, source } => {
                tracing::error!(%operation, "Upstream call error: {source}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "UPSTREAM_CALL_ERROR",
                    operation.failure_message().to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
