//! HTTP proxy between chat clients and the model backend.
//!
//! Exposes `POST /api/chat` (JSON relay), `POST /api/chat/stream` (raw byte
//! stream relay) and `GET /health`. Request bodies reach the backend byte for
//! byte. Failures are answered with a `{ error, details }` envelope: status
//! 400 for malformed requests, 500 for backend failures.

pub mod config;
pub mod error;
pub mod handlers;

pub use config::ProxyConfig;
pub use error::{ProxyError, Result};

use axum::{
    Router,
    body::Bytes,
    http::header::CONTENT_TYPE,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared handler state
#[derive(Clone)]
pub struct ProxyState {
    client: reqwest::Client,
    backend_url: Arc<str>,
}

impl ProxyState {
    pub fn new(backend_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), backend_url)
    }

    pub fn with_client(client: reqwest::Client, backend_url: &str) -> Self {
        Self {
            client,
            backend_url: Arc::from(backend_url.trim_end_matches('/')),
        }
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    /// POST the request body bytes unchanged to a backend path
    pub(crate) async fn forward(&self, path: &str, body: Bytes) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.backend_url, path);
        tracing::debug!(%url, bytes = body.len(), "Forwarding to backend");
        Ok(self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?)
    }
}

pub fn build_router(state: ProxyState) -> Router {
    Router::new()
        .route("/api/chat", post(handlers::chat))
        .route("/api/chat/stream", post(handlers::chat_stream))
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
