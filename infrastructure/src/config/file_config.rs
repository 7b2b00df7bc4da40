//! Serde view of `council.toml`.

use council_application::{
    ConflictConfig, CouncilConfig, EmbeddingConfig, RagConfig,
};
use council_domain::{ModelId, TrustWeights};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub council: FileCouncilConfig,
    pub rag: FileRagConfig,
    pub providers: FileProvidersConfig,
}

/// `[council]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    pub models: Vec<String>,
    pub chairman: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub enable_review: bool,
}

impl Default for FileCouncilConfig {
    fn default() -> Self {
        let defaults = CouncilConfig::default();
        Self {
            models: Vec::new(),
            chairman: defaults.chairman.to_string(),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            enable_review: defaults.enable_review,
        }
    }
}

/// `[rag]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRagConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub similarity_threshold: f64,
    pub max_context_tokens: usize,
    pub recency_decay_days: u32,
    pub weights: FileWeights,
    pub conflict: FileConflictConfig,
    pub embedding: FileEmbeddingConfig,
}

impl Default for FileRagConfig {
    fn default() -> Self {
        let defaults = RagConfig::default();
        Self {
            chunk_size: defaults.chunk_size,
            chunk_overlap: defaults.chunk_overlap,
            top_k: defaults.top_k,
            similarity_threshold: defaults.similarity_threshold,
            max_context_tokens: defaults.max_context_tokens,
            recency_decay_days: defaults.recency_decay_days,
            weights: FileWeights::default(),
            conflict: FileConflictConfig::default(),
            embedding: FileEmbeddingConfig::default(),
        }
    }
}

/// `[rag.weights]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWeights {
    pub similarity: f64,
    pub source_trust: f64,
    pub recency: f64,
    pub authority: f64,
}

impl Default for FileWeights {
    fn default() -> Self {
        let defaults = TrustWeights::default();
        Self {
            similarity: defaults.similarity,
            source_trust: defaults.source_trust,
            recency: defaults.recency,
            authority: defaults.authority,
        }
    }
}

/// `[rag.conflict]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConflictConfig {
    pub model: String,
    pub confidence_threshold: f64,
    pub check_top_n: usize,
    pub max_comparisons: usize,
}

impl Default for FileConflictConfig {
    fn default() -> Self {
        let defaults = ConflictConfig::default();
        Self {
            model: defaults.model.to_string(),
            confidence_threshold: defaults.confidence_threshold,
            check_top_n: defaults.check_top_n,
            max_comparisons: defaults.max_comparisons,
        }
    }
}

/// `[rag.embedding]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEmbeddingConfig {
    pub model: String,
    pub dimensions: usize,
    pub max_batch_size: usize,
}

impl Default for FileEmbeddingConfig {
    fn default() -> Self {
        let defaults = EmbeddingConfig::default();
        Self {
            model: defaults.model,
            dimensions: defaults.dimensions,
            max_batch_size: defaults.max_batch_size,
        }
    }
}

/// `[providers]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    /// Provider used for models no roster lists; "openai" when unset
    pub default: Option<String>,
    /// Explicit `model -> provider name` overrides
    pub routing: HashMap<String, String>,
    pub openai: FileProviderEntry,
    pub openrouter: FileProviderEntry,
}

/// One provider's connection settings.
///
/// Unset fields fall back to per-provider conventions (see
/// [`FileConfig::openai_settings`] / [`FileConfig::openrouter_settings`]),
/// so a partial `[providers.openrouter]` table keeps the canonical env var
/// and base URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderEntry {
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    /// Models this provider serves
    pub models: Vec<String>,
    /// Per-call timeout
    pub timeout_secs: u64,
}

impl Default for FileProviderEntry {
    fn default() -> Self {
        Self {
            api_key_env: None,
            base_url: None,
            models: Vec::new(),
            timeout_secs: 120,
        }
    }
}

/// Fully-resolved connection settings for one provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key_env: String,
    pub base_url: String,
    pub models: Vec<ModelId>,
    pub timeout_secs: u64,
}

impl FileConfig {
    /// Council configuration for the use-case layer.
    pub fn council_config(&self) -> CouncilConfig {
        CouncilConfig {
            members: self.council.models.iter().map(ModelId::new).collect(),
            chairman: ModelId::new(&self.council.chairman),
            temperature: self.council.temperature,
            max_tokens: self.council.max_tokens,
            enable_review: self.council.enable_review,
        }
    }

    /// Retrieval configuration for the use-case layer.
    pub fn rag_config(&self) -> RagConfig {
        RagConfig {
            chunk_size: self.rag.chunk_size,
            chunk_overlap: self.rag.chunk_overlap,
            top_k: self.rag.top_k,
            similarity_threshold: self.rag.similarity_threshold,
            max_context_tokens: self.rag.max_context_tokens,
            weights: TrustWeights::new(
                self.rag.weights.similarity,
                self.rag.weights.source_trust,
                self.rag.weights.recency,
                self.rag.weights.authority,
            ),
            recency_decay_days: self.rag.recency_decay_days,
            conflict: ConflictConfig {
                model: ModelId::new(&self.rag.conflict.model),
                confidence_threshold: self.rag.conflict.confidence_threshold,
                check_top_n: self.rag.conflict.check_top_n,
                max_comparisons: self.rag.conflict.max_comparisons,
                max_passage_chars: ConflictConfig::default().max_passage_chars,
            },
        }
    }

    /// Embedding configuration for the use-case layer.
    pub fn embedding_config(&self) -> EmbeddingConfig {
        EmbeddingConfig {
            model: self.rag.embedding.model.clone(),
            dimensions: self.rag.embedding.dimensions,
            max_batch_size: self.rag.embedding.max_batch_size,
        }
    }

    /// Resolved OpenAI connection settings.
    pub fn openai_settings(&self) -> ProviderSettings {
        Self::resolve(
            &self.providers.openai,
            "OPENAI_API_KEY",
            crate::providers::openai::DEFAULT_BASE_URL,
        )
    }

    /// Resolved OpenRouter connection settings.
    pub fn openrouter_settings(&self) -> ProviderSettings {
        Self::resolve(
            &self.providers.openrouter,
            "OPENROUTER_API_KEY",
            crate::providers::openrouter::DEFAULT_BASE_URL,
        )
    }

    /// The provider serving models no roster lists.
    pub fn default_provider(&self) -> &str {
        self.providers.default.as_deref().unwrap_or("openai")
    }

    fn resolve(
        entry: &FileProviderEntry,
        default_env: &str,
        default_base_url: &str,
    ) -> ProviderSettings {
        ProviderSettings {
            api_key_env: entry
                .api_key_env
                .clone()
                .unwrap_or_else(|| default_env.to_string()),
            base_url: entry
                .base_url
                .clone()
                .unwrap_or_else(|| default_base_url.to_string()),
            models: entry.models.iter().map(ModelId::new).collect(),
            timeout_secs: entry.timeout_secs,
        }
    }
}
