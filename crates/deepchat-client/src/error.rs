//! Error types for deepchat-client

use thiserror::Error;

use crate::types::{ErrorEnvelope, error_details};

/// Result type alias using deepchat-client Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the chat backend
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-success status
    #[error("API error ({status}): {error}")]
    Api {
        status: u16,
        error: String,
        details: String,
    },

    /// Transport failed while a response body was streaming
    #[error("Stream error: {0}")]
    Stream(String),
}

impl Error {
    /// Build an API error from a non-success status and its body.
    ///
    /// A `{ error, details }` envelope is used as-is; any other body becomes
    /// the details of a generic HTTP error.
    pub fn from_response(status: u16, body: &str) -> Self {
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
            return Self::Api {
                status,
                error: envelope.error,
                details: envelope.details,
            };
        }

        Self::Api {
            status,
            error: format!("HTTP {}", status),
            details: error_details(body).unwrap_or_default(),
        }
    }

    /// Text shown to the user in place of an assistant reply
    pub fn user_message(&self) -> String {
        match self {
            Error::Api { error, details, .. } if details.is_empty() => format!("Error: {}", error),
            Error::Api { error, details, .. } => format!("Error: {} - {}", error, details),
            other => format!("Error: {}", other),
        }
    }

    /// HTTP status reported by the server, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_envelope() {
        let e = Error::from_response(
            500,
            r#"{"error":"Backend error","details":"upstream returned 503"}"#,
        );
        match &e {
            Error::Api {
                status,
                error,
                details,
            } => {
                assert_eq!(*status, 500);
                assert_eq!(error, "Backend error");
                assert_eq!(details, "upstream returned 503");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(
            e.user_message(),
            "Error: Backend error - upstream returned 503"
        );
    }

    #[test]
    fn test_from_response_plain_body() {
        let e = Error::from_response(503, "Service Unavailable");
        assert_eq!(e.status(), Some(503));
        assert_eq!(e.user_message(), "Error: HTTP 503 - Service Unavailable");
    }

    #[test]
    fn test_from_response_empty_body() {
        let e = Error::from_response(502, "");
        assert_eq!(e.user_message(), "Error: HTTP 502");
    }

    #[test]
    fn test_user_message_non_api() {
        let e = Error::Stream("connection reset".into());
        assert_eq!(e.user_message(), "Error: Stream error: connection reset");
        assert_eq!(e.status(), None);
    }
}
