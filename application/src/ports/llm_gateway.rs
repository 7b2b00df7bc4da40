//! LLM Gateway port
//!
//! Defines the interface for communicating with LLM providers.

use async_trait::async_trait;
use council_domain::{ModelId, ModelInfo};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during provider calls.
///
/// Per-call timeouts are enforced here at the gateway boundary, never by the
/// orchestrator: a slow model surfaces as `Timeout` for that one call only.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Timeout")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider returned status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),
}

/// Role of a chat message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in the ordered conversation sent to a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling parameters for one generation call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 4000,
        }
    }
}

impl GenerationParams {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// An event in a streaming generation.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A text fragment from the model.
    Delta(String),
    /// The complete response text (signals stream end).
    Completed(String),
    /// An error that occurred during streaming.
    Error(String),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed(_) | StreamEvent::Error(_))
    }
}

/// Handle for receiving streaming events from a generation call.
///
/// The underlying sequence is lazy, finite, and non-restartable; dropping
/// the handle abandons the in-flight call (best effort).
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(mut self) -> Result<String, GatewayError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::Completed(text) => {
                    if full_text.is_empty() {
                        return Ok(text);
                    }
                    return Ok(full_text);
                }
                StreamEvent::Error(e) => {
                    return Err(GatewayError::MalformedResponse(e));
                }
            }
        }
        // Channel closed without Completed — return what we have
        Ok(full_text)
    }
}

/// Gateway for LLM communication.
///
/// This port defines how the application layer talks to providers; which
/// provider serves which model is decided by the adapter at configuration
/// time.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Generate a complete response.
    ///
    /// `messages` must be a non-empty ordered conversation.
    async fn generate(
        &self,
        model: &ModelId,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<String, GatewayError>;

    /// Generate a streaming response.
    ///
    /// Default implementation calls `generate()` and wraps the result in a
    /// single `Completed` event, so non-streaming gateways work unchanged.
    async fn stream_generate(
        &self,
        model: &ModelId,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<StreamHandle, GatewayError> {
        let result = self.generate(model, messages, params).await?;
        let (tx, rx) = mpsc::channel(1);
        // If the receiver is dropped, that's fine
        let _ = tx.send(StreamEvent::Completed(result)).await;
        Ok(StreamHandle::new(rx))
    }

    /// The models this gateway can serve.
    async fn available_models(&self) -> Result<Vec<ModelInfo>, GatewayError>;
}
