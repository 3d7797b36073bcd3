//! Core types shared by the client, the session and the proxy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Model label used when the backend does not name the model that answered
pub const DEFAULT_MODEL_LABEL: &str = "DeepSeek V3";

/// Opaque unique identifier of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    /// Get the sender as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single turn in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// Text of the message. Replaced wholesale while an assistant turn streams.
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    /// Label of the backend model that produced an assistant message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Synthetic message reporting a failed send
    #[serde(default)]
    pub is_error: bool,
    /// Assistant turn still being assembled from a stream
    #[serde(default)]
    pub is_streaming: bool,
}

impl Message {
    /// Create a finalized user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            content: content.into(),
            sender: Sender::User,
            timestamp: Utc::now(),
            model: None,
            is_error: false,
            is_streaming: false,
        }
    }

    /// Create a finalized assistant message
    pub fn assistant(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            content: content.into(),
            sender: Sender::Assistant,
            timestamp: Utc::now(),
            model: Some(model.into()),
            is_error: false,
            is_streaming: false,
        }
    }

    /// Create an assistant message that will keep receiving stream updates
    pub fn assistant_streaming(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            is_streaming: true,
            ..Self::assistant(content, model)
        }
    }

    /// Create an assistant-authored error message
    pub fn error(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            content: content.into(),
            sender: Sender::Assistant,
            timestamp: Utc::now(),
            model: None,
            is_error: true,
            is_streaming: false,
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    pub fn is_assistant(&self) -> bool {
        self.sender == Sender::Assistant
    }
}

/// Request body for both chat endpoints.
///
/// Fields other than `message` are carried through untouched so callers can
/// extend the request without the proxy knowing about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Reply of the synchronous chat endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ChatReply {
    /// Model label, falling back to the default when the backend sent none
    pub fn model_label(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL_LABEL)
    }
}

/// Uniform error body returned by the proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(default)]
    pub details: String,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

/// Extract a human-readable error description from an arbitrary error body.
///
/// JSON bodies are searched for the usual `details`/`detail`/`error`/`message`
/// fields; anything else is returned as trimmed text. Empty bodies yield `None`.
pub fn error_details(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["details", "detail", "error", "message"] {
            match map.get(key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => return Some(s.clone()),
                Some(serde_json::Value::Null) | None => {}
                Some(serde_json::Value::String(_)) => {}
                Some(other) => return Some(other.to_string()),
            }
        }
    }

    Some(body.to_string())
}

/// One decoded `data:` payload of a streamed response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl StreamFrame {
    /// Whether this frame marks the end of the assistant turn
    pub fn is_end(&self) -> bool {
        self.kind.as_deref() == Some("end")
    }
}
