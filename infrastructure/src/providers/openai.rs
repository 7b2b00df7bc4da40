//! OpenAI provider adapter.

use super::openai_compat::ChatCompletionsClient;
use super::{ProviderAdapter, ProviderKind};
use async_trait::async_trait;
use council_application::{ChatMessage, GatewayError, GenerationParams, StreamHandle};
use council_domain::ModelId;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiAdapter {
    client: ChatCompletionsClient,
    models: Vec<ModelId>,
}

impl OpenAiAdapter {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        models: Vec<ModelId>,
        timeout_secs: u64,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            client: ChatCompletionsClient::new(base_url, api_key, timeout_secs)?,
            models,
        })
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
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
