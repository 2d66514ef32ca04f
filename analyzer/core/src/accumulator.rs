//! Response Accumulator
//!
//! Folds stream events into the authoritative view of "what has the model
//! said so far" plus the request lifecycle status.
//!
//! # State Machine
//!
//! ```text
//!          submit             first delta             complete
//!   Idle ──────────▶ Submitted ──────────▶ Streaming ──────────▶ Idle (transcript reset)
//!                       │  ▲                   │
//!                 error │  │ submit            │ error
//!                       ▼  │                   │
//!                      Error ◀─────────────────┘
//! ```
//!
//! The accumulator is a plain reducer. It never waits on anything and owns no
//! I/O, so it can be driven from tests by feeding a scripted event sequence.
//!
//! Every request gets a [`Generation`]. Events are applied only when they
//! carry the current generation, which keeps late deltas from a cancelled
//! request out of the next one.

use tracing::debug;

use crate::events::StreamEvent;
use crate::messages::{Message, MessageRole, PartKind};

/// Request lifecycle status
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Ready for input
    #[default]
    Idle,
    /// Request sent, nothing received yet
    Submitted,
    /// Deltas are arriving
    Streaming,
    /// The last request failed in transport or at the model
    Error,
}

impl Status {
    /// Whether a request is in flight
    #[must_use]
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Submitted | Self::Streaming)
    }

    /// Human-readable description
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Submitted => "Analyzing...",
            Self::Streaming => "Responding...",
            Self::Error => "Error",
        }
    }
}

/// Sequence number of a submitted request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a submission was ignored
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Text was empty or whitespace only
    Empty,
    /// A request is already in flight
    Busy(Status),
}

/// An accepted submission, ready for dispatch
#[derive(Clone, Debug)]
pub struct Submission {
    /// Generation assigned to this request
    pub generation: Generation,
    /// Transcript to send to the model
    pub messages: Vec<Message>,
}

/// A finished assistant turn, handed over for extraction
#[derive(Clone, Debug)]
pub struct CompletedTurn {
    /// Generation of the request that produced it
    pub generation: Generation,
    /// The complete assistant message
    pub message: Message,
}

/// Reducer over stream events
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    status: Status,
    transcript: Vec<Message>,
    generation: Generation,
    last_error: Option<String>,
    /// Reasoning of the current turn, appended as deltas arrive
    reasoning: String,
}

impl ResponseAccumulator {
    /// Create an idle accumulator with an empty transcript
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Generation of the most recent submission
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Messages of the current exchange
    #[must_use]
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Error text of the last transport/model failure, kept until the next submit
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The assistant message being streamed, if one has started
    #[must_use]
    pub fn in_progress(&self) -> Option<&Message> {
        self.transcript
            .last()
            .filter(|m| m.role == MessageRole::Assistant)
    }

    /// Reasoning received so far for the current turn
    ///
    /// Kept after an error alongside the transcript.
    #[must_use]
    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    /// Whether the "still thinking" affordance should be shown
    ///
    /// True while a request is in flight and no text delta has arrived yet.
    #[must_use]
    pub fn is_thinking(&self) -> bool {
        self.status.is_busy()
            && !self
                .in_progress()
                .is_some_and(|m| m.has_part(PartKind::Text))
    }

    /// Accept new text for analysis
    ///
    /// Moves `Idle`/`Error` to `Submitted` and appends one user message holding
    /// the trimmed text. A stale transcript left behind by an error is dropped
    /// first, so every request starts from a single user message.
    ///
    /// # Errors
    ///
    /// Returns a [`Rejection`] (and changes nothing) when the text is blank or
    /// a request is already in flight.
    pub fn submit(&mut self, text: &str) -> Result<Submission, Rejection> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Rejection::Empty);
        }
        if self.status.is_busy() {
            return Err(Rejection::Busy(self.status));
        }

        if self.status == Status::Error {
            self.transcript.clear();
            self.reasoning.clear();
            self.last_error = None;
        }

        self.generation = Generation(self.generation.0 + 1);
        self.transcript.push(Message::user(text));
        self.status = Status::Submitted;
        debug!(generation = %self.generation, chars = text.len(), "Submission accepted");

        Ok(Submission {
            generation: self.generation,
            messages: self.transcript.clone(),
        })
    }

    /// Append a delta to the in-progress assistant message
    ///
    /// Returns whether the delta was applied. Deltas from another generation,
    /// or arriving while nothing is in flight, are dropped.
    pub fn on_part_delta(&mut self, generation: Generation, kind: PartKind, delta: &str) -> bool {
        if !self.accepts(generation) {
            debug!(%generation, current = %self.generation, ?kind, "Dropping stale delta");
            return false;
        }

        if self.status == Status::Submitted {
            self.status = Status::Streaming;
        }

        if self.in_progress().is_none() {
            self.transcript.push(Message::assistant());
        }
        if let Some(msg) = self.transcript.last_mut() {
            msg.push_delta(kind, delta);
        }
        if kind == PartKind::Reasoning {
            self.reasoning.push_str(delta);
        }
        true
    }

    /// Finish the current turn
    ///
    /// Resets status to `Idle` and clears the whole transcript before handing
    /// the assistant message back. The completion's own message is used when
    /// it has content, otherwise the accumulated one.
    pub fn on_complete(
        &mut self,
        generation: Generation,
        final_message: Message,
    ) -> Option<CompletedTurn> {
        if !self.accepts(generation) {
            debug!(%generation, current = %self.generation, "Dropping stale completion");
            return None;
        }

        let accumulated = self.reset();
        let message = if final_message.parts.is_empty() {
            accumulated.unwrap_or_else(Message::assistant)
        } else {
            final_message
        };

        debug!(%generation, parts = message.parts.len(), "Turn complete, transcript cleared");
        Some(CompletedTurn {
            generation,
            message,
        })
    }

    /// Record a transport/model failure
    ///
    /// The transcript is kept for display. Returns whether the error applied.
    pub fn on_error(&mut self, generation: Generation, error: impl Into<String>) -> bool {
        if !self.accepts(generation) {
            debug!(%generation, current = %self.generation, "Dropping stale error");
            return false;
        }
        self.status = Status::Error;
        self.last_error = Some(error.into());
        true
    }

    /// Apply one stream event
    ///
    /// Returns the completed turn when `event` is an accepted completion.
    pub fn apply(&mut self, generation: Generation, event: StreamEvent) -> Option<CompletedTurn> {
        if let Some((kind, delta)) = event.as_delta() {
            self.on_part_delta(generation, kind, delta);
            return None;
        }
        match event {
            StreamEvent::Complete(message) => self.on_complete(generation, message),
            StreamEvent::Error(error) => {
                self.on_error(generation, error);
                None
            }
            StreamEvent::ReasoningDelta(_) | StreamEvent::TextDelta(_) => None,
        }
    }

    /// Abandon the in-flight request
    ///
    /// Goes straight to `Idle` without producing a turn. Bumps the generation
    /// so anything still arriving for the abandoned request is stale.
    pub fn cancel(&mut self) -> bool {
        if !self.status.is_busy() {
            return false;
        }
        let cancelled = self.generation;
        self.generation = Generation(self.generation.0 + 1);
        self.reset();
        debug!(%cancelled, "Request cancelled");
        true
    }

    fn accepts(&self, generation: Generation) -> bool {
        generation == self.generation && self.status.is_busy()
    }

    /// Return to `Idle` with an empty transcript, yielding the assistant message
    fn reset(&mut self) -> Option<Message> {
        self.status = Status::Idle;
        self.reasoning.clear();
        let transcript = std::mem::take(&mut self.transcript);
        transcript
            .into_iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
    }
}
