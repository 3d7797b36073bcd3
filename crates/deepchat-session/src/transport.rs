//! Transport abstraction for sending chat requests

use async_trait::async_trait;
use deepchat_client::{ChatClient, ChatReply, ChatRequest, Result, TurnEventStream};

/// Transport for one chat exchange, in either request mode
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a message and wait for the complete reply
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply>;

    /// Send a message and stream the reply as turn events
    async fn chat_stream(
        &self,
        request: &ChatRequest,
        default_model: &str,
    ) -> Result<TurnEventStream>;
}

/// HTTP transport backed by [`ChatClient`]
pub struct HttpTransport {
    client: ChatClient,
}

impl HttpTransport {
    /// Create a transport for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: ChatClient::new(base_url),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        self.client.chat(request).await
    }

    async fn chat_stream(
        &self,
        request: &ChatRequest,
        default_model: &str,
    ) -> Result<TurnEventStream> {
        self.client.chat_stream(request, default_model).await
    }
}
