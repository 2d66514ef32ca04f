//! Presentation Snapshots
//!
//! After every applied event the analyzer publishes a [`Snapshot`] of what a
//! surface should show. Snapshots travel over a `tokio::sync::watch` channel,
//! so slow surfaces simply see the latest state.
//!
//! The same record set is republished on every event. Surfaces use
//! [`Snapshot::results_revision`] to render each set exactly once.

use std::sync::Arc;

use tokio::sync::watch;

use crate::accumulator::{ResponseAccumulator, Status};
use crate::results::ResultBoard;
use crate::sentiment::SentimentRecord;

/// What a surface should display right now
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Request lifecycle status
    pub status: Status,
    /// Reasoning streamed so far for the current turn (kept after an error)
    pub reasoning: String,
    /// Whether to show the "thinking..." affordance
    pub thinking: bool,
    /// Current result set, in model order
    pub records: Arc<[SentimentRecord]>,
    /// Bumped each time `records` is replaced
    pub results_revision: u64,
    /// Transport/model error text while in `Status::Error`
    pub last_error: Option<String>,
    /// Description of the last failed extraction, if the latest attempt failed
    pub extraction_failure: Option<String>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            status: Status::Idle,
            reasoning: String::new(),
            thinking: false,
            records: Arc::from(Vec::new()),
            results_revision: 0,
            last_error: None,
            extraction_failure: None,
        }
    }
}

impl Snapshot {
    /// Capture the current state of the reducers
    #[must_use]
    pub fn capture(accumulator: &ResponseAccumulator, results: &ResultBoard) -> Self {
        Self {
            status: accumulator.status(),
            reasoning: accumulator.reasoning().to_string(),
            thinking: accumulator.is_thinking(),
            records: Arc::clone(results.records()),
            results_revision: results.revision(),
            last_error: accumulator.last_error().map(str::to_string),
            extraction_failure: results.last_failure().map(str::to_string),
        }
    }

    /// Whether input should be accepted
    #[must_use]
    pub fn accepts_input(&self) -> bool {
        !self.status.is_busy()
    }
}

/// Sending side of the snapshot channel
#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: watch::Sender<Snapshot>,
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotPublisher {
    /// Create a publisher holding the default (idle, empty) snapshot
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::default());
        Self { tx }
    }

    /// Subscribe a surface; it immediately sees the latest snapshot
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Publish a snapshot
    ///
    /// Stored even with no subscribers, so late subscribers start current.
    pub fn publish(&self, snapshot: Snapshot) {
        self.tx.send_replace(snapshot);
    }

    /// Latest published snapshot
    #[must_use]
    pub fn current(&self) -> Snapshot {
        self.tx.borrow().clone()
    }
}
