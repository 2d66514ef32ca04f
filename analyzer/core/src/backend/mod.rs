//! LLM Backend Integration
//!
//! This module provides abstracted access to LLM backends through a common
//! trait interface. A backend plays two roles for the analyzer: it dispatches
//! the transcript to the model and decodes the streamed reply into
//! [`StreamEvent`]s.
//!
//! # Available Backends
//!
//! - **Ollama**: Local LLM server (default), via `/api/chat` with `think`
//!
//! # Usage
//!
//! ```ignore
//! use analyzer_core::backend::{AnalysisRequest, LlmBackend, OllamaBackend};
//! use analyzer_core::Message;
//!
//! let backend = OllamaBackend::new("localhost", 11434, Duration::from_secs(30))?;
//! let request = AnalysisRequest::new(vec![Message::user("What a day!")], "sentiment-engine");
//! let rx = backend.analyze(&request).await?;
//! ```

mod ollama;
mod traits;

pub use ollama::{ChatStreamDecoder, OllamaBackend};
pub use traits::{AnalysisRequest, BackendConfig, LlmBackend, ModelInfo};

pub use crate::events::StreamEvent;
