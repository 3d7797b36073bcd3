//! Route handlers forwarding chat requests to the backend

use axum::{
    body::{Body, Bytes},
    extract::{State, rejection::BytesRejection},
    http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use deepchat_client::{
    ChatRequest, error_details,
    client::{CHAT_PATH, CHAT_STREAM_PATH},
};
use futures::TryStreamExt;

use crate::ProxyState;
use crate::error::{ProxyError, Result};

/// Describe a failed backend response: its error body, or the status line when empty
async fn failure_details(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error_details(&body).unwrap_or_else(|| status.to_string())
}

/// Check that the body is a JSON object with a `message` string.
///
/// The bytes themselves are forwarded untouched.
fn validate_body(body: std::result::Result<Bytes, BytesRejection>) -> Result<(Bytes, usize)> {
    let body = body.map_err(|rejection| ProxyError::InvalidRequest {
        details: rejection.body_text(),
    })?;
    let request: ChatRequest =
        serde_json::from_slice(&body).map_err(|e| ProxyError::InvalidRequest {
            details: e.to_string(),
        })?;
    Ok((body, request.message.len()))
}

/// `POST /api/chat`: forward and relay the backend JSON unchanged
pub async fn chat(
    State(state): State<ProxyState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Response> {
    let (body, chars) = validate_body(body)?;
    tracing::info!(chars, "Forwarding chat request");

    let response = state.forward(CHAT_PATH, body).await?;
    let status = response.status();
    if !status.is_success() {
        let details = failure_details(response).await;
        tracing::error!(%status, %details, "Backend chat request failed");
        return Err(ProxyError::Backend { details });
    }

    let body = response.bytes().await.map_err(|e| ProxyError::Read {
        details: e.to_string(),
    })?;
    Ok(([(CONTENT_TYPE, "application/json")], body).into_response())
}

/// `POST /api/chat/stream`: relay the backend byte stream as it arrives
pub async fn chat_stream(
    State(state): State<ProxyState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Response> {
    let (body, chars) = validate_body(body)?;
    tracing::info!(chars, "Forwarding chat stream request");

    let response = state.forward(CHAT_STREAM_PATH, body).await?;
    let status = response.status();
    if !status.is_success() {
        let details = failure_details(response).await;
        tracing::error!(%status, %details, "Backend stream request failed");
        return Err(ProxyError::Stream { details });
    }

    let stream = response
        .bytes_stream()
        .inspect_err(|e| tracing::error!(error = %e, "Backend stream interrupted"));

    Ok((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8"),
            (CACHE_CONTROL, "no-cache"),
            (CONNECTION, "keep-alive"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

pub async fn health() -> &'static str {
    "OK"
}
