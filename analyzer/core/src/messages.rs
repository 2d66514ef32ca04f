//! Transcript Messages
//!
//! The messages exchanged with the model during one analysis. A message is an
//! ordered list of typed parts: `Reasoning` parts carry the model's visible
//! thinking and `Text` parts carry the answer that gets extracted.
//!
//! Parts of the same kind are treated as one unit by concatenating them in
//! arrival order, see [`Message::text`] and [`Message::reasoning`].

use serde::{Deserialize, Serialize};

/// Message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Text submitted for analysis
    User,
    /// The model's reply
    Assistant,
}

impl MessageRole {
    /// Wire name used by chat APIs
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Kind of a message part
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    /// The model's streamed thinking
    Reasoning,
    /// The model's answer
    Text,
}

/// A typed fragment of a message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    /// What this fragment holds
    pub kind: PartKind,
    /// Fragment content, grown delta by delta while streaming
    pub text: String,
}

impl Part {
    /// Create a part
    pub fn new(kind: PartKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(PartKind::Text, text)
    }

    /// Create a reasoning part
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::new(PartKind::Reasoning, text)
    }
}

/// One turn in the exchange
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: MessageId,
    /// Who sent this message
    pub role: MessageRole,
    /// Ordered parts
    pub parts: Vec<Part>,
}

impl Message {
    /// Create an empty message
    pub fn new(role: MessageRole) -> Self {
        Self {
            id: MessageId::new(),
            role,
            parts: Vec::new(),
        }
    }

    /// Create a user message holding a single text part
    pub fn user(text: impl Into<String>) -> Self {
        let mut msg = Self::new(MessageRole::User);
        msg.parts.push(Part::text(text));
        msg
    }

    /// Create an empty assistant message, ready to receive deltas
    pub fn assistant() -> Self {
        Self::new(MessageRole::Assistant)
    }

    /// Builder-style part append
    #[must_use]
    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Append a delta to the open part of `kind`
    ///
    /// The open part is the last part when it has the same kind. Otherwise a
    /// new part is started, so a kind switch always begins a fresh segment.
    pub fn push_delta(&mut self, kind: PartKind, delta: &str) {
        match self.parts.last_mut() {
            Some(part) if part.kind == kind => part.text.push_str(delta),
            _ => self.parts.push(Part::new(kind, delta)),
        }
    }

    /// Whether any part of `kind` exists
    #[must_use]
    pub fn has_part(&self, kind: PartKind) -> bool {
        self.parts.iter().any(|p| p.kind == kind)
    }

    /// Concatenation of every part of `kind`, in arrival order
    #[must_use]
    pub fn joined(&self, kind: PartKind) -> String {
        self.parts
            .iter()
            .filter(|p| p.kind == kind)
            .map(|p| p.text.as_str())
            .collect()
    }

    /// The answer text (all text parts)
    #[must_use]
    pub fn text(&self) -> String {
        self.joined(PartKind::Text)
    }

    /// The reasoning text (all reasoning parts)
    #[must_use]
    pub fn reasoning(&self) -> String {
        self.joined(PartKind::Reasoning)
    }
}
