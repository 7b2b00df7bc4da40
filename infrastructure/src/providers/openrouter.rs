//! OpenRouter provider adapter.
//!
//! Same wire format as OpenAI, different host plus the attribution headers
//! OpenRouter asks clients to send.

use super::openai_compat::ChatCompletionsClient;
use super::{ProviderAdapter, ProviderKind};
use async_trait::async_trait;
use council_application::{ChatMessage, GatewayError, GenerationParams, StreamHandle};
use council_domain::ModelId;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

pub struct OpenRouterAdapter {
    client: ChatCompletionsClient,
    models: Vec<ModelId>,
}

impl OpenRouterAdapter {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        models: Vec<ModelId>,
        timeout_secs: u64,
    ) -> Result<Self, GatewayError> {
        let client = ChatCompletionsClient::new(base_url, api_key, timeout_secs)?
            .with_header("HTTP-Referer", "https://github.com/llm-council/llm-council")
            .with_header("X-Title", "llm-council");
        Ok(Self { client, models })
    }
}

#[async_trait]
impl ProviderAdapter for OpenRouterAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenRouter
    }

    fn models(&self) -> &[ModelId] {
        &self.models
    }

    async fn generate(
        &self,
        model: &ModelId,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<String, GatewayError> {
        self.client.generate(model, messages, params).await
    }

    async fn stream_generate(
        &self,
        model: &ModelId,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<StreamHandle, GatewayError> {
        self.client.stream_generate(model, messages, params).await
    }
}
