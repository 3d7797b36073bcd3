//! HTTP client for the chat endpoints

use futures::StreamExt;

use crate::{
    error::{Error, Result},
    stream::{ByteStream, TurnEventStream, assemble},
    types::{ChatReply, ChatRequest},
};

/// Path of the synchronous endpoint, relative to the base URL
pub const CHAT_PATH: &str = "/chat";
/// Path of the streaming endpoint, relative to the base URL
pub const CHAT_STREAM_PATH: &str = "/chat/stream";

/// Client for a server exposing `/chat` and `/chat/stream`.
///
/// Works against the backend directly or against the proxy's `/api` prefix.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    /// Create a client for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing reqwest client
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a message and wait for the complete reply
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        let url = self.url(CHAT_PATH);
        tracing::debug!(%url, "Sending chat request");

        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Chat request failed");
            return Err(Error::from_response(status.as_u16(), &text));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Open the streaming endpoint and return its raw body chunks.
    ///
    /// A non-success status fails here, before any byte is decoded.
    pub async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream> {
        let url = self.url(CHAT_STREAM_PATH);
        tracing::debug!(%url, "Opening chat stream");

        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Chat stream failed to open");
            return Err(Error::from_response(status.as_u16(), &text));
        }

        let bytes = response
            .bytes_stream()
            .map(|item| item.map_err(|e| Error::Stream(e.to_string())));
        Ok(Box::pin(bytes))
    }

    /// Open the streaming endpoint and decode it into turn events
    pub async fn chat_stream(
        &self,
        request: &ChatRequest,
        default_model: &str,
    ) -> Result<TurnEventStream> {
        let bytes = self.open_stream(request).await?;
        Ok(assemble(bytes, default_model))
    }
}
