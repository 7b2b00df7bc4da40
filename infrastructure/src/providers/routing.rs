//! Config-time routing of models to provider adapters.

use super::{ProviderAdapter, ProviderKind};
use async_trait::async_trait;
use council_application::{ChatMessage, GatewayError, GenerationParams, LlmGateway, StreamHandle};
use council_domain::{ModelId, ModelInfo};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Gateway that dispatches each call to the provider serving that model.
///
/// The model -> provider table is built once at construction from the
/// providers' configured rosters plus any explicit routing overrides.
/// Resolution never inspects model id strings at call time.
pub struct RoutingGateway {
    providers: Vec<Arc<dyn ProviderAdapter>>,
    /// Model id string -> index into `providers`
    table: HashMap<String, usize>,
    default_index: Option<usize>,
}

impl RoutingGateway {
    /// Build the routing table.
    ///
    /// Priority per model:
    /// 1. an explicit `model -> provider name` override from config
    /// 2. the roster of the provider that lists the model
    /// 3. the default provider, when configured
    pub fn new(
        providers: Vec<Arc<dyn ProviderAdapter>>,
        overrides: &HashMap<String, String>,
        default_provider: Option<&str>,
    ) -> Self {
        let mut table = HashMap::new();

        // Roster-derived entries first; overrides replace them below
        for (index, provider) in providers.iter().enumerate() {
            for model in provider.models() {
                table.entry(model.as_str().to_string()).or_insert(index);
            }
        }

        for (model, provider_name) in overrides {
            let Some(kind) = ProviderKind::parse(provider_name) else {
                debug!(provider = %provider_name, "ignoring routing override for unknown provider");
                continue;
            };
            if let Some(index) = providers.iter().position(|p| p.kind() == kind) {
                table.insert(model.clone(), index);
            }
        }

        let default_index = default_provider
            .and_then(ProviderKind::parse)
            .and_then(|kind| providers.iter().position(|p| p.kind() == kind));

        Self {
            providers,
            table,
            default_index,
        }
    }

    fn resolve(&self, model: &ModelId) -> Result<&dyn ProviderAdapter, GatewayError> {
        if let Some(&index) = self.table.get(model.as_str()) {
            return Ok(self.providers[index].as_ref());
        }
        if let Some(index) = self.default_index {
            return Ok(self.providers[index].as_ref());
        }
        Err(GatewayError::ModelNotAvailable(model.to_string()))
    }
}

#[async_trait]
impl LlmGateway for RoutingGateway {
    async fn generate(
        &self,
        model: &ModelId,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<String, GatewayError> {
        self.resolve(model)?.generate(model, messages, params).await
    }

    async fn stream_generate(
        &self,
        model: &ModelId,
        messages: &[ChatMessage],
        params: GenerationParams,
    ) -> Result<StreamHandle, GatewayError> {
        self.resolve(model)?
            .stream_generate(model, messages, params)
            .await
    }

    async fn available_models(&self) -> Result<Vec<ModelInfo>, GatewayError> {
        let mut models = Vec::new();
        for provider in &self.providers {
            for model in provider.models() {
                models.push(ModelInfo::new(model.clone(), provider.kind().as_str()));
            }
        }
        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeProvider {
        kind: ProviderKind,
        models: Vec<ModelId>,
        reply: String,
    }

    #[async_trait]
    impl ProviderAdapter for FakeProvider {
        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn models(&self) -> &[ModelId] {
            &self.models
        }

        async fn generate(
            &self,
            _: &ModelId,
            _: &[ChatMessage],
            _: GenerationParams,
        ) -> Result<String, GatewayError> {
            Ok(self.reply.clone())
        }

        async fn stream_generate(
            &self,
            model: &ModelId,
            messages: &[ChatMessage],
            params: GenerationParams,
        ) -> Result<StreamHandle, GatewayError> {
            let text = self.generate(model, messages, params).await?;
            let (tx, rx) = tokio::sync::mpsc::channel(1);
            let _ = tx
                .send(council_application::StreamEvent::Completed(text))
                .await;
            Ok(StreamHandle::new(rx))
        }
    }

    fn gateway(overrides: HashMap<String, String>, default: Option<&str>) -> RoutingGateway {
        let providers: Vec<Arc<dyn ProviderAdapter>> = vec![
            Arc::new(FakeProvider {
                kind: ProviderKind::OpenAi,
                models: vec![ModelId::new("gpt-5.2")],
                reply: "from openai".into(),
            }),
            Arc::new(FakeProvider {
                kind: ProviderKind::OpenRouter,
                models: vec![ModelId::new("z-ai/glm-4.5-air:free")],
                reply: "from openrouter".into(),
            }),
        ];
        RoutingGateway::new(providers, &overrides, default)
    }

    #[tokio::test]
    async fn test_roster_routing() {
        let gw = gateway(HashMap::new(), None);
        let messages = [ChatMessage::user("hi")];
        let reply = gw
            .generate(
                &ModelId::new("z-ai/glm-4.5-air:free"),
                &messages,
                GenerationParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(reply, "from openrouter");
    }

    #[tokio::test]
    async fn test_override_beats_roster() {
        let overrides =
            HashMap::from([("gpt-5.2".to_string(), "openrouter".to_string())]);
        let gw = gateway(overrides, None);
        let messages = [ChatMessage::user("hi")];
        let reply = gw
            .generate(&ModelId::new("gpt-5.2"), &messages, GenerationParams::default())
            .await
            .unwrap();
        assert_eq!(reply, "from openrouter");
    }

    #[tokio::test]
    async fn test_unknown_model_uses_default() {
        let gw = gateway(HashMap::new(), Some("openai"));
        let messages = [ChatMessage::user("hi")];
        let reply = gw
            .generate(
                &ModelId::new("never-heard-of-it"),
                &messages,
                GenerationParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(reply, "from openai");
    }

    #[tokio::test]
    async fn test_unknown_model_without_default_errors() {
        let gw = gateway(HashMap::new(), None);
        let messages = [ChatMessage::user("hi")];
        let err = gw
            .generate(
                &ModelId::new("never-heard-of-it"),
                &messages,
                GenerationParams::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::ModelNotAvailable(_)));
    }

    #[tokio::test]
    async fn test_available_models_spans_providers() {
        let gw = gateway(HashMap::new(), None);
        let models = gw.available_models().await.unwrap();
        assert_eq!(models.len(), 2);
        assert!(models.iter().any(|m| m.provider == "openai"));
        assert!(models.iter().any(|m| m.provider == "openrouter"));
    }
}
