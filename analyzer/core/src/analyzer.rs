//! Analyzer - The Orchestration Core
//!
//! The Analyzer wires the pure reducers to a backend:
//! - dispatches accepted submissions to the LLM backend
//! - applies stream events to the [`ResponseAccumulator`]
//! - runs the extractor on completed turns and updates the [`ResultBoard`]
//! - publishes a [`Snapshot`] after every applied event
//!
//! # Design Philosophy
//!
//! The Analyzer is UI-agnostic. Surfaces subscribe to snapshots and forward
//! user text through [`Analyzer::submit`]; nothing else is shared.
//!
//! Each stream receiver is tagged with the generation of the request that
//! opened it. Dropping the receiver on cancel stops delivery, and the
//! accumulator's generation check drops anything that slips through.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use crate::accumulator::{CompletedTurn, Generation, Rejection, ResponseAccumulator, Status};
use crate::backend::{AnalysisRequest, LlmBackend};
use crate::events::StreamEvent;
use crate::extractor;
use crate::results::ResultBoard;
use crate::snapshot::{Snapshot, SnapshotPublisher};

/// Analyzer configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Model to use
    pub model: String,
    /// Ask the model to stream its reasoning
    pub think: bool,
    /// System prompt
    pub system_prompt: Option<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: "sentiment-engine".to_string(),
            think: true,
            system_prompt: None,
        }
    }
}

/// What happened to the most recently finished request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Records were extracted and replaced the result set
    Extracted,
    /// The model answered but the answer could not be decoded
    ExtractionFailed,
    /// The transport or the model reported an error
    Failed,
    /// The request was cancelled
    Cancelled,
}

/// The Analyzer - headless streaming interpreter
pub struct Analyzer<B: LlmBackend> {
    /// Configuration
    config: AnalyzerConfig,
    /// LLM backend
    backend: Arc<B>,
    /// Transcript and status
    accumulator: ResponseAccumulator,
    /// Records on display
    results: ResultBoard,
    /// Current stream, tagged with the generation it belongs to
    streaming_rx: Option<(Generation, mpsc::Receiver<StreamEvent>)>,
    /// Outcome of the last finished request
    last_outcome: Option<Outcome>,
    /// Snapshot channel to surfaces
    publisher: SnapshotPublisher,
}

impl<B: LlmBackend + 'static> Analyzer<B> {
    /// Create a new Analyzer with the given backend
    pub fn new(backend: B, config: AnalyzerConfig) -> Self {
        Self {
            config,
            backend: Arc::new(backend),
            accumulator: ResponseAccumulator::new(),
            results: ResultBoard::new(),
            streaming_rx: None,
            last_outcome: None,
            publisher: SnapshotPublisher::new(),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Get the backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Current status
    pub fn status(&self) -> Status {
        self.accumulator.status()
    }

    /// Transcript and status reducer
    pub fn accumulator(&self) -> &ResponseAccumulator {
        &self.accumulator
    }

    /// Records on display
    pub fn results(&self) -> &ResultBoard {
        &self.results
    }

    /// Outcome of the most recently finished request
    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    /// Subscribe to snapshots
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.publisher.subscribe()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.publisher.current()
    }

    /// Submit text for analysis
    ///
    /// Returns `Ok(false)` when the submission is ignored (blank text or a
    /// request already in flight). A backend that fails to start the stream
    /// puts the analyzer in `Status::Error`; that is not an `Err`.
    ///
    /// # Errors
    ///
    /// Reserved for failures outside the request lifecycle; dispatch failures
    /// are reported through the status instead.
    pub async fn submit(&mut self, text: &str) -> anyhow::Result<bool> {
        let submission = match self.accumulator.submit(text) {
            Ok(submission) => submission,
            Err(Rejection::Empty) => {
                debug!("Ignoring empty submission");
                return Ok(false);
            }
            Err(Rejection::Busy(status)) => {
                debug!(?status, "Ignoring submission while busy");
                return Ok(false);
            }
        };
        self.publish();

        let generation = submission.generation;
        let mut request = AnalysisRequest::new(submission.messages, &self.config.model)
            .with_think(self.config.think);
        if let Some(ref system) = self.config.system_prompt {
            request = request.with_system(system.clone());
        }

        info!(%generation, model = %self.config.model, backend = self.backend.name(), "Dispatching analysis");
        match self.backend.analyze(&request).await {
            Ok(rx) => {
                self.streaming_rx = Some((generation, rx));
            }
            Err(e) => {
                error!(%generation, error = %e, "Failed to start analysis");
                self.apply_event(generation, StreamEvent::Error(format!("{e:#}")));
            }
        }

        Ok(true)
    }

    /// Poll for stream events without waiting
    ///
    /// Call this regularly to process incoming events.
    /// Returns true if there was activity.
    pub fn poll_streaming(&mut self) -> bool {
        // First, collect all available events to avoid borrow issues
        let (generation, events, closed) = {
            let Some((generation, rx)) = self.streaming_rx.as_mut() else {
                return false;
            };

            let mut collected = Vec::new();
            let mut closed = false;
            loop {
                match rx.try_recv() {
                    Ok(event) => {
                        let terminal = event.is_terminal();
                        collected.push(event);
                        if terminal {
                            break;
                        }
                    }
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        closed = true;
                        break;
                    }
                }
            }
            (*generation, collected, closed)
        };

        if events.is_empty() && !closed {
            return false;
        }

        for event in events {
            self.apply_event(generation, event);
        }
        if closed {
            self.on_stream_closed(generation);
        }
        true
    }

    /// Wait for the next stream event and apply it
    ///
    /// Returns false when no stream is open.
    pub async fn process_next(&mut self) -> bool {
        let Some((generation, rx)) = self.streaming_rx.as_mut() else {
            return false;
        };
        let generation = *generation;

        match rx.recv().await {
            Some(event) => self.apply_event(generation, event),
            None => self.on_stream_closed(generation),
        }
        true
    }

    /// Process events until the current request settles
    pub async fn run_until_settled(&mut self) -> Status {
        while self.status().is_busy() {
            if !self.process_next().await {
                break;
            }
        }
        self.status()
    }

    /// Abandon the in-flight request
    ///
    /// Status returns to `Idle` directly; no extraction runs. Returns whether
    /// anything was cancelled.
    pub fn cancel(&mut self) -> bool {
        self.streaming_rx = None;
        if !self.accumulator.cancel() {
            return false;
        }
        info!("Analysis cancelled");
        self.last_outcome = Some(Outcome::Cancelled);
        self.publish();
        true
    }

    /// Apply one event to the reducers and publish the result
    fn apply_event(&mut self, generation: Generation, event: StreamEvent) {
        let terminal = event.is_terminal();
        let before = self.status();
        let was_busy = before.is_busy();

        if let Some(turn) = self.accumulator.apply(generation, event) {
            // Transcript is already cleared at this point
            self.extract(turn);
        } else if was_busy && self.status() == Status::Error {
            error!(
                %generation,
                error = self.accumulator.last_error().unwrap_or_default(),
                "Analysis failed"
            );
            self.last_outcome = Some(Outcome::Failed);
        }

        if self.status() != before {
            debug!(%generation, status = self.status().description(), "Status changed");
        }
        if terminal {
            self.close_stream(generation);
        }
        self.publish();
    }

    fn extract(&mut self, turn: CompletedTurn) {
        let outcome = extractor::extract(&turn.message);
        self.last_outcome = Some(if self.results.apply(outcome) {
            Outcome::Extracted
        } else {
            Outcome::ExtractionFailed
        });
        debug!(generation = %turn.generation, outcome = ?self.last_outcome, "Extraction finished");
    }

    /// The stream ended without a terminal event
    fn on_stream_closed(&mut self, generation: Generation) {
        self.close_stream(generation);
        if self.accumulator.generation() == generation && self.status().is_busy() {
            self.apply_event(
                generation,
                StreamEvent::Error("Stream closed before the response completed".to_string()),
            );
        }
    }

    fn close_stream(&mut self, generation: Generation) {
        if matches!(self.streaming_rx, Some((open, _)) if open == generation) {
            self.streaming_rx = None;
        }
    }

    fn publish(&self) {
        self.publisher
            .publish(Snapshot::capture(&self.accumulator, &self.results));
    }
}
