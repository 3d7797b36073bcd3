//! Session event types

use deepchat_client::Message;
use serde::{Deserialize, Serialize};

use crate::session::ChatMode;

/// Events emitted while the session changes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A send was accepted
    SendStart { mode: ChatMode },

    /// A message was appended to the conversation
    MessageAdded { message: Message },

    /// The content of a streaming message was replaced
    MessageUpdated { message: Message },

    /// A streaming message stopped changing
    MessageFinalized { message: Message },

    /// The send finished; `failed` is set when an error message was appended
    SendEnd { failed: bool },

    /// The conversation was reset
    Cleared,

    /// The request mode changed
    ModeChanged { mode: ChatMode },
}
