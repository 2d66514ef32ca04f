//! Analyzer Core - Streaming Sentiment Interpretation
//!
//! This crate turns a streamed model answer into structured sentiment
//! records. It tracks the request lifecycle for one piece of text, keeps the
//! reasoning visible while it streams, and decodes the final answer into
//! [`SentimentRecord`]s once the stream completes. It knows nothing about
//! terminals; the `sentiment` CLI is one surface, tests are another.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Surfaces                                │
//! │        ┌──────────────┐              ┌──────────────────┐        │
//! │        │ sentiment CLI│              │ tests / headless │        │
//! │        └──────┬───────┘              └────────┬─────────┘        │
//! │               │    submit / cancel (down)     │                  │
//! │               │    Snapshot (watch, up)       │                  │
//! └───────────────┼───────────────────────────────┼──────────────────┘
//!                 │                               │
//! ┌───────────────┼───────────────────────────────┼──────────────────┐
//! │               └──────────────┬────────────────┘   ANALYZER CORE  │
//! │                        ┌─────┴─────┐                             │
//! │                        │ Analyzer  │                             │
//! │                        └─────┬─────┘                             │
//! │        ┌─────────────────────┼─────────────────────┐             │
//! │  ┌─────┴───────┐      ┌──────┴──────┐       ┌──────┴──────┐      │
//! │  │  Response   │ turn │  Sentiment  │ recs  │   Result    │      │
//! │  │ Accumulator ├─────►│  Extractor  ├──────►│   Board     │      │
//! │  └─────▲───────┘      └─────────────┘       └─────────────┘      │
//! │        │ StreamEvent                                             │
//! │  ┌─────┴───────┐                                                 │
//! │  │ LlmBackend  │  (Ollama /api/chat, NDJSON)                     │
//! │  └─────────────┘                                                 │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Analyzer`]: Drives one request at a time against a backend
//! - [`ResponseAccumulator`]: Pure reducer for transcript and status
//! - [`extractor::extract`]: Turns a completed message into records
//! - [`ResultBoard`]: The record set on display and its revision
//! - [`Snapshot`]: What a surface should render right now
//!
//! # Quick Start
//!
//! ```ignore
//! use analyzer_core::{load_config, Analyzer, OllamaBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let backend = OllamaBackend::from_config(&config.backend, config.request_timeout)?;
//!     let mut analyzer = Analyzer::new(backend, config.analyzer);
//!
//!     analyzer.submit("The service was slow but the staff were lovely").await?;
//!     analyzer.run_until_settled().await;
//!
//!     for record in analyzer.results().records().iter() {
//!         println!("{} {} {}%", record.polarity(), record.emotion(), record.confidence_percent());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`accumulator`]: Request lifecycle and transcript reducer
//! - [`analyzer`]: Main Analyzer struct
//! - [`backend`]: LLM backend abstraction (Ollama)
//! - [`config`]: TOML and environment configuration
//! - [`events`]: Stream events delivered by backends
//! - [`extractor`]: Fence stripping and strict record decoding
//! - [`messages`]: Transcript messages and parts
//! - [`results`]: Current record set
//! - [`sentiment`]: Sentiment record types
//! - [`snapshot`]: Presentation snapshots and their channel

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod accumulator;
pub mod analyzer;
pub mod backend;
pub mod config;
pub mod events;
pub mod extractor;
pub mod messages;
pub mod results;
pub mod sentiment;
pub mod snapshot;

// Re-exports for convenience
pub use accumulator::{CompletedTurn, Generation, Rejection, ResponseAccumulator, Status, Submission};
pub use analyzer::{Analyzer, AnalyzerConfig, Outcome};
pub use backend::{AnalysisRequest, BackendConfig, LlmBackend, ModelInfo, OllamaBackend};
pub use events::StreamEvent;
pub use extractor::ExtractError;
pub use messages::{Message, MessageId, MessageRole, Part, PartKind};
pub use results::ResultBoard;
pub use sentiment::{Emotion, Polarity, RecordError, SentimentRecord};
pub use snapshot::{Snapshot, SnapshotPublisher};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, AnalyzerConfigFile, AnalyzerToml,
    ConfigError, ConfigOverrides, ConfigSource,
};
