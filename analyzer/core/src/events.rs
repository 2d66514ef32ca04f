//! Stream Events
//!
//! The typed events a backend produces for one assistant turn: zero or more
//! reasoning deltas, zero or more text deltas, then exactly one terminal
//! event (`Complete` or `Error`).

use crate::messages::{Message, PartKind};

/// One event from a model response stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// A chunk of the model's thinking
    ReasoningDelta(String),
    /// A chunk of the model's answer
    TextDelta(String),
    /// Response completed successfully
    Complete(Message),
    /// Error occurred during streaming
    Error(String),
}

impl StreamEvent {
    /// Whether this event ends the turn
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Error(_))
    }

    /// Part kind and text for delta events
    #[must_use]
    pub fn as_delta(&self) -> Option<(PartKind, &str)> {
        match self {
            Self::ReasoningDelta(text) => Some((PartKind::Reasoning, text)),
            Self::TextDelta(text) => Some((PartKind::Text, text)),
            Self::Complete(_) | Self::Error(_) => None,
        }
    }
}
