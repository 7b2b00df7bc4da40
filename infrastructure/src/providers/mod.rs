//! Provider adapters.
//!
//! Each provider variant is a capability implementation of
//! [`ProviderAdapter`]; the [`routing::RoutingGateway`] picks one per model
//! from a table built once at configuration time. No call-time inspection
//! of model id strings happens anywhere.

pub mod openai;
pub mod openai_compat;
pub mod openrouter;
pub mod routing;

use async_trait::async_trait;
use council_application::{ChatMessage, GatewayError, GenerationParams, StreamHandle};
use council_domain::ModelId;

/// The provider variants this build knows how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    OpenRouter,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::OpenRouter => "openrouter",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "openai" => Some(ProviderKind::OpenAi),
            "openrouter" => Some(ProviderKind::OpenRouter),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One LLM backend.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Models this provider is configured to serve.
    fn models(&self) -> &[ModelId];

    fn supports_model(&self, model: &ModelId) -> bool {
        self.models().contains(model)
    }

    async fn generate(
        &self,
        model: &ModelId,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<String, GatewayError>;

    async fn stream_generate(
        &self,
        model: &ModelId,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<StreamHandle, GatewayError>;
}
