//! Conversation state: an ordered message list with an id index.

use std::collections::HashMap;

use deepchat_client::{Message, MessageId};

/// Ordered messages of one conversation.
///
/// Messages keep submission/arrival order. The id index makes the
/// "does this turn's message exist yet" check O(1).
#[derive(Debug, Default, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    index: HashMap<MessageId, usize>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, returning its id
    pub fn push(&mut self, message: Message) -> MessageId {
        let id = message.id;
        self.index.insert(id, self.messages.len());
        self.messages.push(message);
        id
    }

    /// Replace the content (and model label) of an existing message
    pub fn update_content(
        &mut self,
        id: MessageId,
        content: String,
        model: Option<String>,
    ) -> Option<&Message> {
        let message = self.get_mut(id)?;
        message.content = content;
        if model.is_some() {
            message.model = model;
        }
        Some(&*message)
    }

    /// Mark a streaming message as final
    pub fn finalize(&mut self, id: MessageId) -> Option<&Message> {
        let message = self.get_mut(id)?;
        message.is_streaming = false;
        Some(&*message)
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.index.get(&id).map(|&pos| &self.messages[pos])
    }

    fn get_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        let pos = *self.index.get(&id)?;
        self.messages.get_mut(pos)
    }

    /// Remove every message
    pub fn clear(&mut self) {
        self.messages.clear();
        self.index.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
