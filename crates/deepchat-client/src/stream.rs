//! Streaming turn events and the assembler that folds frames into them

use crate::decoder::{FrameDecoder, FrameEvent};
use crate::error::Result;
use async_stream::stream;
use bytes::Bytes;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tokio_stream::Stream;

/// Events emitted while an assistant turn streams in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// New cumulative content of the turn
    Update { content: String, model: String },
    /// The turn ended (end marker or stream exhausted)
    Done {
        content: String,
        model: String,
        /// Number of content frames received
        frames: usize,
    },
    /// Transport failed mid-stream
    Error { message: String },
}

impl TurnEvent {
    /// Check if this is a terminal event (Done or Error)
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnEvent::Done { .. } | TurnEvent::Error { .. })
    }
}

/// A stream of raw response body chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A stream of turn events
pub type TurnEventStream = Pin<Box<dyn Stream<Item = TurnEvent> + Send>>;

/// Snapshot of the turn after a content frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnUpdate {
    pub content: String,
    pub model: String,
}

/// Folds frame events into the current state of one assistant turn.
///
/// Each content frame carries the whole text so far, so content is replaced,
/// never appended.
#[derive(Debug)]
pub struct TurnAssembler {
    default_model: String,
    content: String,
    model: String,
    frames: usize,
    finished: bool,
}

impl TurnAssembler {
    pub fn new(default_model: impl Into<String>) -> Self {
        let default_model = default_model.into();
        Self {
            model: default_model.clone(),
            default_model,
            content: String::new(),
            frames: 0,
            finished: false,
        }
    }

    /// Apply one frame event, returning the new state for content frames
    pub fn apply(&mut self, event: FrameEvent) -> Option<TurnUpdate> {
        if self.finished {
            return None;
        }

        match event {
            FrameEvent::Content { content, model } => {
                self.content = content;
                self.model = model.unwrap_or_else(|| self.default_model.clone());
                self.frames += 1;
                Some(TurnUpdate {
                    content: self.content.clone(),
                    model: self.model.clone(),
                })
            }
            FrameEvent::End => {
                self.finished = true;
                None
            }
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Number of content frames applied
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Whether the end-of-turn marker was seen
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Turn a raw response body into turn events.
///
/// One `Update` is yielded per content frame, before the next chunk is read.
/// The end marker stops reading altogether: lines after it, in the same chunk
/// or later ones, are not processed. Exactly one terminal event ends the
/// stream.
pub fn assemble(mut bytes: ByteStream, default_model: impl Into<String>) -> TurnEventStream {
    let mut turn = TurnAssembler::new(default_model);

    Box::pin(stream! {
        let mut decoder = FrameDecoder::new();

        loop {
            let (events, exhausted) = match bytes.next().await {
                Some(Ok(chunk)) => (decoder.push(&chunk), false),
                Some(Err(e)) => {
                    tracing::warn!(error = %e, frames = turn.frames(), "Chat stream aborted");
                    yield TurnEvent::Error { message: e.user_message() };
                    return;
                }
                None => (decoder.finish(), true),
            };

            for event in events {
                if let Some(update) = turn.apply(event) {
                    tracing::debug!(chars = update.content.len(), model = %update.model, "Stream frame");
                    yield TurnEvent::Update {
                        content: update.content,
                        model: update.model,
                    };
                }
                if turn.is_finished() {
                    break;
                }
            }

            if exhausted || turn.is_finished() {
                break;
            }
        }

        yield TurnEvent::Done {
            content: turn.content().to_string(),
            model: turn.model().to_string(),
            frames: turn.frames(),
        };
    })
}
