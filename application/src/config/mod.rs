//! Configuration types injected into the use cases.
//!
//! There is no global settings object: each component receives the config
//! slice it needs at construction and behaves as a pure function of
//! (inputs, config) from then on.

use council_domain::{ModelId, TrustWeights};
use serde::{Deserialize, Serialize};

/// Configuration for a council deliberation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilConfig {
    /// Models asked for first opinions
    pub members: Vec<ModelId>,
    /// Model that synthesizes the final answer; need not sit on the council
    pub chairman: ModelId,
    /// Sampling temperature for first opinions and synthesis
    pub temperature: f32,
    /// Token cap per generation call
    pub max_tokens: u32,
    /// Whether to run the peer-review stage
    pub enable_review: bool,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            chairman: ModelId::new("gpt-5.2"),
            temperature: 0.7,
            max_tokens: 4000,
            enable_review: true,
        }
    }
}

impl CouncilConfig {
    pub fn with_members(mut self, members: Vec<ModelId>) -> Self {
        self.members = members;
        self
    }

    pub fn with_chairman(mut self, chairman: impl Into<ModelId>) -> Self {
        self.chairman = chairman.into();
        self
    }

    pub fn without_review(mut self) -> Self {
        self.enable_review = false;
        self
    }
}

/// Configuration for the conflict detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictConfig {
    /// Classifier model for pairwise comparison
    pub model: ModelId,
    /// Minimum confidence for a conflict to be reported
    pub confidence_threshold: f64,
    /// How many top-scored chunks enter pairing
    pub check_top_n: usize,
    /// Hard cap on pairwise comparisons per query
    pub max_comparisons: usize,
    /// Passage characters sent to the classifier per side
    pub max_passage_chars: usize,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            model: ModelId::new("gpt-5-mini"),
            confidence_threshold: 0.6,
            check_top_n: 5,
            // n*(n-1)/2 for the default top 5
            max_comparisons: 10,
            max_passage_chars: 2000,
        }
    }
}

/// Configuration for the embedding engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimensions: usize,
    pub max_batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            max_batch_size: 100,
        }
    }
}

/// Configuration for retrieval and context building.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Target chunk size in tokens
    pub chunk_size: usize,
    /// Overlap carried between consecutive chunks, in tokens
    pub chunk_overlap: usize,
    /// Chunks kept after filtering
    pub top_k: usize,
    /// Minimum similarity for a candidate to survive
    pub similarity_threshold: f64,
    /// Token budget for the rendered context block
    pub max_context_tokens: usize,
    /// Raw scoring weights; normalized by the scorer
    pub weights: TrustWeights,
    /// Days for the recency score to decay by e
    pub recency_decay_days: u32,
    /// Conflict detection settings
    pub conflict: ConflictConfig,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 50,
            top_k: 5,
            similarity_threshold: 0.25,
            max_context_tokens: 2000,
            weights: TrustWeights::default(),
            recency_decay_days: 365,
            conflict: ConflictConfig::default(),
        }
    }
}

impl RagConfig {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }
}
