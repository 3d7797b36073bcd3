//! deepchat-session: Conversation state and send orchestration
//!
//! This crate owns the ordered message list of a chat, drives one send at a
//! time in streaming or synchronous mode, and publishes progress events.

pub mod conversation;
pub mod error;
pub mod events;
pub mod handle;
pub mod session;
pub mod transport;

pub use conversation::Conversation;
pub use error::{Error, Result};
pub use events::SessionEvent;
pub use handle::SessionHandle;
pub use session::{ChatMode, SendOutcome, Session, SessionConfig};
pub use transport::{HttpTransport, Transport};
