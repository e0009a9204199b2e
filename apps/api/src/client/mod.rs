//! Terminal client: drives the assessment flow against the API server and
//! talks to the hosted auth/data service. No client code calls the model.

use thiserror::Error;

pub mod api;
pub mod backend;
pub mod flow;
pub mod render;
pub mod session;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx from the assessment API; `message` is what the server chose to show.
    #[error("{message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The server answered 2xx with a body that breaks the wire contract.
    #[error("Unexpected response from server: {0}")]
    Contract(String),

    #[error("{0}")]
    Auth(String),

    #[error("Data service error (status {status}): {message}")]
    Data { status: u16, message: String },
}
