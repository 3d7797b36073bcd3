//! Session state and send orchestration

use std::{fmt, str::FromStr, sync::Arc};

use deepchat_client::{ChatRequest, DEFAULT_MODEL_LABEL, Message, MessageId, TurnEvent};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{
    conversation::Conversation,
    error::{Error, Result},
    events::SessionEvent,
    handle::SessionHandle,
    transport::Transport,
};

/// How a message is sent to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Incremental reply over `/chat/stream`
    #[default]
    Stream,
    /// Single JSON reply over `/chat`
    Sync,
}

impl ChatMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Stream => "stream",
            ChatMode::Sync => "sync",
        }
    }

    /// The other mode
    pub fn toggled(self) -> Self {
        match self {
            ChatMode::Stream => ChatMode::Sync,
            ChatMode::Sync => ChatMode::Stream,
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stream" | "streaming" => Ok(ChatMode::Stream),
            "sync" | "json" => Ok(ChatMode::Sync),
            other => Err(format!("unknown mode '{}' (expected stream or sync)", other)),
        }
    }
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Request mode used by `send`
    pub mode: ChatMode,
    /// Model label used when the backend names none
    pub model_label: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: ChatMode::default(),
            model_label: DEFAULT_MODEL_LABEL.to_string(),
        }
    }
}

/// How a send ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// An assistant reply was stored
    Replied(MessageId),
    /// The stream ended without any content frame
    NoReply,
    /// A synthetic error message was appended
    Failed(MessageId),
}

impl SendOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, SendOutcome::Failed(_))
    }
}

/// A single conversation with a chat backend.
///
/// The session owns the message list and drives one send at a time. Progress
/// is published on a broadcast channel so a UI can render while `send` runs.
pub struct Session {
    config: SessionConfig,
    conversation: Conversation,
    transport: Arc<dyn Transport>,
    event_tx: broadcast::Sender<SessionEvent>,
    handle: SessionHandle,
}

impl Session {
    /// Create a new session
    pub fn new(config: SessionConfig, transport: Arc<dyn Transport>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            config,
            conversation: Conversation::default(),
            transport,
            event_tx,
            handle: SessionHandle::new(),
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Get a cloneable handle for checking the busy flag from UI code.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.handle.is_busy()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn mode(&self) -> ChatMode {
        self.config.mode
    }

    pub fn set_mode(&mut self, mode: ChatMode) {
        if self.config.mode != mode {
            self.config.mode = mode;
            tracing::debug!(%mode, "Chat mode changed");
            self.emit(SessionEvent::ModeChanged { mode });
        }
    }

    /// Switch between streaming and synchronous mode, returning the new mode
    pub fn toggle_mode(&mut self) -> ChatMode {
        self.set_mode(self.config.mode.toggled());
        self.config.mode
    }

    /// Get all messages
    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    /// Remove every message
    pub fn clear(&mut self) {
        self.conversation.clear();
        self.emit(SessionEvent::Cleared);
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    fn add(&mut self, message: Message) -> MessageId {
        let id = self.conversation.push(message.clone());
        self.emit(SessionEvent::MessageAdded { message });
        id
    }

    fn add_error(&mut self, text: String) -> SendOutcome {
        tracing::warn!(error = %text, "Send failed");
        SendOutcome::Failed(self.add(Message::error(text)))
    }

    /// Send user text in the current mode.
    ///
    /// The user message is appended first. Backend failures do not surface as
    /// `Err`: they become an error message in the conversation and a
    /// [`SendOutcome::Failed`]. `Err` means the send was rejected outright.
    pub async fn send(&mut self, text: &str) -> Result<SendOutcome> {
        if text.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }
        let Some(_busy) = self.handle.try_begin() else {
            return Err(Error::Busy);
        };

        let mode = self.config.mode;
        tracing::info!(%mode, chars = text.len(), "Sending message");
        self.emit(SessionEvent::SendStart { mode });
        self.add(Message::user(text));

        let request = ChatRequest::new(text);
        let outcome = match mode {
            ChatMode::Stream => self.send_stream(&request).await,
            ChatMode::Sync => self.send_sync(&request).await,
        };

        self.emit(SessionEvent::SendEnd {
            failed: outcome.is_failed(),
        });
        Ok(outcome)
    }

    async fn send_sync(&mut self, request: &ChatRequest) -> SendOutcome {
        match self.transport.chat(request).await {
            Ok(reply) => {
                let model = reply
                    .model
                    .unwrap_or_else(|| self.config.model_label.clone());
                SendOutcome::Replied(self.add(Message::assistant(reply.response, model)))
            }
            Err(e) => self.add_error(e.user_message()),
        }
    }

    async fn send_stream(&mut self, request: &ChatRequest) -> SendOutcome {
        let mut events = match self
            .transport
            .chat_stream(request, &self.config.model_label)
            .await
        {
            Ok(s) => s,
            Err(e) => return self.add_error(e.user_message()),
        };

        // Created on the first content frame, then replaced in place
        let mut current: Option<MessageId> = None;

        while let Some(event) = events.next().await {
            match event {
                TurnEvent::Update { content, model } => match current {
                    Some(id) => {
                        let updated = self
                            .conversation
                            .update_content(id, content, Some(model))
                            .cloned();
                        if let Some(message) = updated {
                            self.emit(SessionEvent::MessageUpdated { message });
                        }
                    }
                    None => {
                        current = Some(self.add(Message::assistant_streaming(content, model)));
                    }
                },
                TurnEvent::Done { frames, .. } => {
                    tracing::debug!(frames, "Stream finished");
                    break;
                }
                TurnEvent::Error { message } => {
                    self.finalize(current);
                    return self.add_error(message);
                }
            }
        }

        match self.finalize(current) {
            Some(id) => SendOutcome::Replied(id),
            None => SendOutcome::NoReply,
        }
    }

    fn finalize(&mut self, id: Option<MessageId>) -> Option<MessageId> {
        let id = id?;
        if let Some(message) = self.conversation.finalize(id).cloned() {
            self.emit(SessionEvent::MessageFinalized { message });
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use deepchat_client::{ByteStream, ChatReply, Sender, TurnEventStream, stream::assemble};
    use parking_lot::Mutex;

    use crate::transport::HttpTransport;

    /// Canned reply for one send
    enum Reply {
        Sync(std::result::Result<ChatReply, deepchat_client::Error>),
        Chunks(Vec<std::result::Result<&'static str, &'static str>>),
        OpenFailure(deepchat_client::Error),
    }

    struct MockTransport {
        replies: Mutex<Vec<Reply>>,
    }

    impl MockTransport {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Mutex::new(replies),
            }
        }

        fn next(&self) -> Reply {
            let mut replies = self.replies.lock();
            if replies.is_empty() {
                Reply::Chunks(vec![Ok("data: {\"content\":\"done\"}\n")])
            } else {
                replies.remove(0)
            }
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn chat(&self, _request: &ChatRequest) -> deepchat_client::Result<ChatReply> {
            match self.next() {
                Reply::Sync(result) => result,
                Reply::OpenFailure(e) => Err(e),
                Reply::Chunks(_) => Ok(ChatReply {
                    response: "done".into(),
                    model: None,
                }),
            }
        }

        async fn chat_stream(
            &self,
            _request: &ChatRequest,
            default_model: &str,
        ) -> deepchat_client::Result<TurnEventStream> {
            let chunks = match self.next() {
                Reply::Chunks(chunks) => chunks,
                Reply::OpenFailure(e) => return Err(e),
                Reply::Sync(_) => vec![],
            };
            let bytes: ByteStream = Box::pin(futures::stream::iter(chunks.into_iter().map(
                |c| match c {
                    Ok(text) => Ok(Bytes::from_static(text.as_bytes())),
                    Err(reason) => Err(deepchat_client::Error::Stream(reason.to_string())),
                },
            )));
            Ok(assemble(bytes, default_model))
        }
    }

    fn make_session(mode: ChatMode, replies: Vec<Reply>) -> Session {
        let config = SessionConfig {
            mode,
            ..Default::default()
        };
        Session::new(config, Arc::new(MockTransport::new(replies)))
    }

    fn senders(session: &Session) -> Vec<Sender> {
        session.messages().iter().map(|m| m.sender).collect()
    }

    #[tokio::test]
    async fn test_stream_hel_hello_end() {
        let mut session = make_session(
            ChatMode::Stream,
            vec![Reply::Chunks(vec![
                Ok("data: {\"content\":\"Hel\"}\n"),
                Ok("data: {\"content\":\"Hello\"}\n"),
                Ok("data: {\"type\":\"end\"}\n"),
            ])],
        );

        let outcome = session.send("Hi").await.unwrap();
        assert!(matches!(outcome, SendOutcome::Replied(_)));

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Hi");
        assert_eq!(messages[1].content, "Hello");
        assert_eq!(messages[1].model.as_deref(), Some(DEFAULT_MODEL_LABEL));
        assert!(!messages[1].is_streaming);
        assert_eq!(
            session.messages().iter().filter(|m| m.is_assistant()).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_stream_publishes_each_update() {
        let mut session = make_session(
            ChatMode::Stream,
            vec![Reply::Chunks(vec![
                Ok("data: {\"content\":\"A\"}\n"),
                Ok("data: {\"content\":\"AB\"}\ndata: {\"content\":\"ABC\"}\n"),
                Ok("data: {\"type\":\"end\"}\n"),
            ])],
        );
        let mut rx = session.subscribe();

        session.send("go").await.unwrap();

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                SessionEvent::MessageAdded { message } if message.is_assistant() => {
                    seen.push(message.content)
                }
                SessionEvent::MessageUpdated { message } => seen.push(message.content),
                _ => {}
            }
        }
        assert_eq!(seen, vec!["A", "AB", "ABC"]);
    }

    #[tokio::test]
    async fn test_stream_open_failure() {
        let mut session = make_session(
            ChatMode::Stream,
            vec![Reply::OpenFailure(deepchat_client::Error::from_response(
                500,
                r#"{"error":"Backend error","details":"boom"}"#,
            ))],
        );

        let outcome = session.send("Hi").await.unwrap();
        assert!(outcome.is_failed());

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].is_error);
        assert!(messages[1].is_assistant());
        assert_eq!(messages[1].content, "Error: Backend error - boom");
    }

    #[tokio::test]
    async fn test_stream_transport_failure_keeps_partial_content() {
        let mut session = make_session(
            ChatMode::Stream,
            vec![Reply::Chunks(vec![
                Ok("data: {\"content\":\"partial\"}\n"),
                Err("connection reset"),
            ])],
        );

        let outcome = session.send("Hi").await.unwrap();
        assert!(outcome.is_failed());

        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content, "partial");
        assert!(!messages[1].is_streaming);
        assert!(messages[2].is_error);
        assert!(messages[2].content.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_stream_without_frames_adds_no_assistant_message() {
        let mut session = make_session(
            ChatMode::Stream,
            vec![Reply::Chunks(vec![Ok("data: {\"type\":\"end\"}\n")])],
        );

        let outcome = session.send("Hi").await.unwrap();
        assert_eq!(outcome, SendOutcome::NoReply);
        assert_eq!(senders(&session), vec![Sender::User]);
    }

    #[tokio::test]
    async fn test_sync_reply() {
        let mut session = make_session(
            ChatMode::Sync,
            vec![Reply::Sync(Ok(ChatReply {
                response: "Hello there".into(),
                model: Some("deepseek-chat".into()),
            }))],
        );

        session.send("Hi").await.unwrap();
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "Hello there");
        assert_eq!(messages[1].model.as_deref(), Some("deepseek-chat"));
    }

    #[tokio::test]
    async fn test_sync_503_from_backend() {
        use wiremock::{
            Mock, MockServer, ResponseTemplate,
            matchers::{method, path},
        };

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(serde_json::json!({ "detail": "model overloaded" })),
            )
            .mount(&server)
            .await;

        let config = SessionConfig {
            mode: ChatMode::Sync,
            ..Default::default()
        };
        let mut session = Session::new(config, Arc::new(HttpTransport::new(server.uri())));

        let outcome = session.send("Hi").await.unwrap();
        assert!(outcome.is_failed());

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_user());
        assert!(messages[1].is_error);
        assert!(messages[1].content.contains("model overloaded"));
        assert_eq!(
            messages.iter().filter(|m| m.is_assistant()).count(),
            1,
            "no partial message next to the error"
        );
    }

    #[tokio::test]
    async fn test_two_sends_in_order() {
        let mut session = make_session(
            ChatMode::Stream,
            vec![
                Reply::Chunks(vec![Ok("data: {\"content\":\"first\"}\n")]),
                Reply::Chunks(vec![Ok("data: {\"content\":\"second\"}\n")]),
            ],
        );

        session.send("one").await.unwrap();
        session.send("two").await.unwrap();

        let contents: Vec<_> = session
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["one", "first", "two", "second"]);
        assert_eq!(
            senders(&session),
            vec![Sender::User, Sender::Assistant, Sender::User, Sender::Assistant]
        );
    }

    #[tokio::test]
    async fn test_clear_then_send() {
        let mut session = make_session(ChatMode::Sync, vec![]);
        session.send("one").await.unwrap();
        session.send("two").await.unwrap();
        assert_eq!(session.messages().len(), 4);

        session.clear();
        assert!(session.messages().is_empty());

        session.send("three").await.unwrap();
        assert_eq!(senders(&session), vec![Sender::User, Sender::Assistant]);
    }

    #[tokio::test]
    async fn test_send_rejected_while_busy() {
        let mut session = make_session(ChatMode::Sync, vec![]);
        let handle = session.handle();
        let guard = handle.try_begin();
        assert!(session.is_busy());

        let result = session.send("Hi").await;
        assert!(matches!(result, Err(Error::Busy)));
        assert!(session.messages().is_empty());

        drop(guard);
        assert!(session.send("Hi").await.is_ok());
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let mut session = make_session(ChatMode::Sync, vec![]);
        assert!(matches!(session.send("   \n").await, Err(Error::EmptyMessage)));
        assert!(session.messages().is_empty());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_toggle_mode() {
        let mut session = make_session(ChatMode::Stream, vec![]);
        let mut rx = session.subscribe();
        assert_eq!(session.toggle_mode(), ChatMode::Sync);
        assert_eq!(session.toggle_mode(), ChatMode::Stream);
        assert!(matches!(
            rx.try_recv(),
            Ok(SessionEvent::ModeChanged {
                mode: ChatMode::Sync
            })
        ));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("stream".parse::<ChatMode>(), Ok(ChatMode::Stream));
        assert_eq!(" SYNC ".parse::<ChatMode>(), Ok(ChatMode::Sync));
        assert!("fast".parse::<ChatMode>().is_err());
    }
}
