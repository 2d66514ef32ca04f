//! Ollama Backend Implementation
//!
//! LLM backend for Ollama (local LLM server).
//!
//! # Ollama API
//!
//! - `/api/chat` - Chat completions, streamed as newline-delimited JSON
//! - `/api/tags` - List available models
//!
//! With `"think": true` the chat endpoint streams the model's reasoning in
//! `message.thinking` and the answer in `message.content`. Each line is decoded
//! by [`ChatStreamDecoder`] into [`StreamEvent`]s.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use super::traits::{AnalysisRequest, BackendConfig, LlmBackend, ModelInfo};
use crate::events::StreamEvent;
use crate::messages::{Message, PartKind};

/// Ollama backend client
#[derive(Clone, Debug)]
pub struct OllamaBackend {
    /// Host address
    host: String,
    /// Port number
    port: u16,
    /// HTTP client
    http_client: reqwest::Client,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    ///
    /// `request_timeout` bounds a whole analysis, including the streamed body.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        request_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            host: host.into(),
            port,
            http_client,
        })
    }

    /// Create from `BackendConfig`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &BackendConfig, request_timeout: Duration) -> anyhow::Result<Self> {
        match config {
            BackendConfig::Ollama { host, port } => Self::new(host.clone(), *port, request_timeout),
        }
    }

    /// Get the base URL
    fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Get chat endpoint URL
    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url())
    }

    /// Get tags endpoint URL
    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url())
    }

    /// Build the chat request body
    fn build_body(request: &AnalysisRequest) -> serde_json::Value {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);

        if let Some(ref system) = request.system {
            messages.push(serde_json::json!({
                "role": "system",
                "content": system,
            }));
        }

        for msg in &request.messages {
            messages.push(serde_json::json!({
                "role": msg.role.as_str(),
                "content": msg.text(),
            }));
        }

        serde_json::json!({
            "model": request.model,
            "messages": messages,
            "stream": true,
            "think": request.think,
        })
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "Ollama"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.tags_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> anyhow::Result<mpsc::Receiver<StreamEvent>> {
        let (tx, rx) = mpsc::channel(100);

        let response = self
            .http_client
            .post(self.chat_url())
            .json(&Self::build_body(request))
            .send()
            .await?;

        // Check for HTTP errors
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {status}: {body}");
        }

        let model = request.model.clone();
        let mut stream = response.bytes_stream();

        // Spawn task to process stream
        tokio::spawn(async move {
            let mut decoder = ChatStreamDecoder::new();

            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        for event in decoder.feed(&bytes) {
                            let terminal = event.is_terminal();
                            if tx.send(event).await.is_err() {
                                debug!(%model, "Receiver dropped, stop streaming");
                                return;
                            }
                            if terminal {
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        error!(%model, error = %e, "Ollama stream failed");
                        let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                        return;
                    }
                }
            }

            // Body ended without a done line
            for event in decoder.finish() {
                if tx.send(event).await.is_err() {
                    return;
                }
            }
        });

        Ok(rx)
    }

    async fn list_models(&self) -> anyhow::Result<Vec<ModelInfo>> {
        let response = self
            .http_client
            .get(self.tags_url())
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {status}: {body}");
        }

        let data: serde_json::Value = response.json().await?;

        let models = data
            .get("models")
            .and_then(|m| m.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| {
                        let name = m.get("name")?.as_str()?.to_string();
                        let size = m.get("size").and_then(serde_json::Value::as_u64);
                        let parameters = m
                            .get("details")
                            .and_then(|d| d.get("parameter_size"))
                            .and_then(|p| p.as_str())
                            .map(String::from);

                        Some(ModelInfo {
                            name,
                            size,
                            parameters,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }
}

// ============================================================================
// NDJSON decoding
// ============================================================================

/// One line of the chat stream
#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    thinking: Option<String>,
}

/// Incremental decoder for the `/api/chat` NDJSON stream
///
/// Bytes are buffered until a newline, so chunk boundaries (including ones
/// that split a multi-byte character) do not matter. The decoder assembles
/// the assistant message as it goes and emits it with the completion.
#[derive(Debug)]
pub struct ChatStreamDecoder {
    buffer: Vec<u8>,
    message: Message,
    finished: bool,
}

impl Default for ChatStreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatStreamDecoder {
    /// Create a decoder for one response
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            message: Message::assistant(),
            finished: false,
        }
    }

    /// Whether a terminal event has been emitted
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feed raw body bytes, returning the events completed by them
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        self.buffer.extend_from_slice(bytes);
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.decode_line(&line, &mut events);
            if self.finished {
                self.buffer.clear();
                break;
            }
        }
        events
    }

    /// Flush at end of body
    ///
    /// Decodes a trailing line without newline. If no terminal event was seen,
    /// completes with whatever was received, or errors if nothing was.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        let rest = std::mem::take(&mut self.buffer);
        self.decode_line(&rest, &mut events);

        if !self.finished {
            self.finished = true;
            if self.message.parts.is_empty() {
                events.push(StreamEvent::Error(
                    "Ollama stream ended before any content".to_string(),
                ));
            } else {
                warn!("Ollama stream ended without done signal");
                events.push(StreamEvent::Complete(std::mem::replace(
                    &mut self.message,
                    Message::assistant(),
                )));
            }
        }
        events
    }

    fn decode_line(&mut self, line: &[u8], events: &mut Vec<StreamEvent>) {
        let line = String::from_utf8_lossy(line);
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        let chunk: ChatChunk = match serde_json::from_str(line) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, line = %line, "Skipping malformed Ollama stream line");
                return;
            }
        };

        if let Some(error) = chunk.error {
            self.finished = true;
            events.push(StreamEvent::Error(error));
            return;
        }

        if let Some(message) = chunk.message {
            if let Some(thinking) = message.thinking.filter(|t| !t.is_empty()) {
                self.message.push_delta(PartKind::Reasoning, &thinking);
                events.push(StreamEvent::ReasoningDelta(thinking));
            }
            if !message.content.is_empty() {
                self.message.push_delta(PartKind::Text, &message.content);
                events.push(StreamEvent::TextDelta(message.content));
            }
        }

        if chunk.done {
            self.finished = true;
            events.push(StreamEvent::Complete(std::mem::replace(
                &mut self.message,
                Message::assistant(),
            )));
        }
    }
}
