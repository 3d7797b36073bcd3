//! Error types for deepchat-session

use thiserror::Error;

/// Result type alias using deepchat-session Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that reject a send before anything is added to the conversation
#[derive(Error, Debug)]
pub enum Error {
    /// A send is already in flight
    #[error("A message is already being sent")]
    Busy,

    /// Input was empty or whitespace only
    #[error("Message is empty")]
    EmptyMessage,

    /// An error from the chat client layer
    #[error(transparent)]
    Client(#[from] deepchat_client::Error),
}
