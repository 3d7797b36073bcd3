//! Proxy error type rendered as the `{ error, details }` envelope

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use deepchat_client::ErrorEnvelope;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    /// The client body is not a JSON object with a `message` string
    #[error("Invalid request: {details}")]
    InvalidRequest { details: String },

    /// The backend could not be reached
    #[error("Failed to connect to backend: {details}")]
    Connect { details: String },

    /// The backend answered `/chat` with a non-success status
    #[error("Failed to get response from backend: {details}")]
    Backend { details: String },

    /// The backend answered `/chat/stream` with a non-success status
    #[error("Failed to start stream: {details}")]
    Stream { details: String },

    /// The backend reply body could not be read
    #[error("Failed to read backend response: {details}")]
    Read { details: String },
}

pub type Result<T> = std::result::Result<T, ProxyError>;

impl ProxyError {
    /// Short label used as the envelope's `error` field
    pub fn title(&self) -> &'static str {
        match self {
            ProxyError::InvalidRequest { .. } => "Invalid request",
            ProxyError::Connect { .. } => "Failed to connect to backend",
            ProxyError::Backend { .. } => "Failed to get response from backend",
            ProxyError::Stream { .. } => "Failed to start stream",
            ProxyError::Read { .. } => "Failed to read backend response",
        }
    }

    pub fn details(&self) -> &str {
        match self {
            ProxyError::InvalidRequest { details }
            | ProxyError::Connect { details }
            | ProxyError::Backend { details }
            | ProxyError::Stream { details }
            | ProxyError::Read { details } => details,
        }
    }

    /// Malformed client requests answer 400; every backend failure answers 500
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(self.title(), self.details())
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        ProxyError::Connect {
            details: e.to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Proxy request failed");
        (self.status(), Json(self.envelope())).into_response()
    }
}
