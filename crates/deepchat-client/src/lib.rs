//! deepchat-client: Client for a DeepSeek-backed chat service
//!
//! This crate talks to the `/chat` and `/chat/stream` endpoints and decodes
//! the `data:`-framed streaming responses into turn events.

pub mod client;
pub mod decoder;
pub mod error;
pub mod stream;
pub mod types;

pub use client::ChatClient;
pub use error::{Error, Result};
pub use stream::{ByteStream, TurnEvent, TurnEventStream};
pub use types::*;
