//! HTTP client for the assessment API.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::assessment::models::{Evaluation, EvaluationRequest, QuestionSet, QUESTION_COUNT};
use crate::client::ClientError;

/// The two assessment calls the flow needs. `HttpAssessmentApi` is the real
/// one; tests substitute in-memory versions.
#[async_trait]
pub trait AssessmentApi: Send + Sync {
    async fn generate_questions(&self, field: &str) -> Result<QuestionSet, ClientError>;

    async fn evaluate_answers(&self, request: &EvaluationRequest) -> Result<Evaluation, ClientError>;
}

#[derive(Debug, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub service: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

#[derive(Clone)]
pub struct HttpAssessmentApi {
    client: Client,
    base_url: String,
}

impl HttpAssessmentApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET /health
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let response = self.client.get(self.url("/health")).send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl AssessmentApi for HttpAssessmentApi {
    async fn generate_questions(&self, field: &str) -> Result<QuestionSet, ClientError> {
        debug!(field, "Requesting questions");
        let response = self
            .client
            .post(self.url("/generate-questions"))
            .json(&json!({ "field": field }))
            .send()
            .await?;

        let set: QuestionSet = ensure_success(response).await?.json().await?;
        if set.questions.len() != QUESTION_COUNT || set.questions.iter().any(|q| q.trim().is_empty()) {
            return Err(ClientError::Contract(format!(
                "expected {QUESTION_COUNT} questions, got {}",
                set.questions.len()
            )));
        }
        Ok(set)
    }

    async fn evaluate_answers(&self, request: &EvaluationRequest) -> Result<Evaluation, ClientError> {
        debug!(field = %request.field, "Requesting evaluation");
        let response = self
            .client
            .post(self.url("/evaluate-answers"))
            .json(request)
            .send()
            .await?;

        let evaluation: Evaluation = ensure_success(response).await?.json().await?;
        evaluation
            .validate()
            .map_err(|e| ClientError::Contract(e.to_string()))?;
        Ok(evaluation)
    }
}

/// Turns a non-2xx response into `ClientError::Api`, reading the server's
/// `{"error": {"code", "message"}}` body when present.
async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(api_error(status.as_u16(), &body))
}

fn api_error(status: u16, body: &str) -> ClientError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => ClientError::Api {
            status,
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => ClientError::Api {
            status,
            code: "UNKNOWN".to_string(),
            message: format!("Request failed with status {status}"),
        },
    }
}
