//! LLM Backend Traits
//!
//! Trait definitions for LLM backends. The analyzer only depends on the shape
//! of the event stream a backend returns, never on a provider's wire format.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::events::StreamEvent;
use crate::messages::Message;

/// Configuration for an analysis request
#[derive(Clone, Debug)]
pub struct AnalysisRequest {
    /// Model to use (backend-specific identifier)
    pub model: String,
    /// Ordered transcript to send
    pub messages: Vec<Message>,
    /// Ask the model to stream its reasoning separately
    pub think: bool,
    /// System prompt (optional, sent ahead of the transcript)
    pub system: Option<String>,
}

impl AnalysisRequest {
    /// Create a new request for a transcript and model
    pub fn new(messages: Vec<Message>, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages,
            think: true,
            system: None,
        }
    }

    /// Set reasoning mode
    #[must_use]
    pub fn with_think(mut self, think: bool) -> Self {
        self.think = think;
        self
    }

    /// Set system prompt
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Information about an available model
#[derive(Clone, Debug)]
pub struct ModelInfo {
    /// Model identifier
    pub name: String,
    /// Model size in bytes (if known)
    pub size: Option<u64>,
    /// Parameter count (if known)
    pub parameters: Option<String>,
}

/// LLM Backend trait
///
/// Implement this trait to add support for different LLM providers.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Get the backend name (e.g., "Ollama")
    fn name(&self) -> &str;

    /// Check if the backend is healthy and reachable
    async fn health_check(&self) -> bool;

    /// Send a transcript and get a streaming response
    ///
    /// The receiver yields reasoning and text deltas, then exactly one
    /// `Complete` or `Error` event.
    async fn analyze(&self, request: &AnalysisRequest)
        -> anyhow::Result<mpsc::Receiver<StreamEvent>>;

    /// List available models
    async fn list_models(&self) -> anyhow::Result<Vec<ModelInfo>>;

    /// Check if a specific model is available
    async fn has_model(&self, model: &str) -> anyhow::Result<bool> {
        let models = self.list_models().await?;
        Ok(models
            .iter()
            .any(|m| m.name == model || m.name.split(':').next() == Some(model)))
    }
}

/// Backend connection configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendConfig {
    /// Direct Ollama connection
    Ollama {
        /// Ollama host address
        host: String,
        /// Ollama port number
        port: u16,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Ollama {
            host: "localhost".to_string(),
            port: 11434,
        }
    }
}

impl BackendConfig {
    /// Create Ollama configuration
    pub fn ollama(host: impl Into<String>, port: u16) -> Self {
        Self::Ollama {
            host: host.into(),
            port,
        }
    }
}
