//! Retrieval-augmented context building.
//!
//! Composes the retriever, trust scorer, and conflict detector into one
//! pipeline: embed the query, over-fetch candidates, filter and score,
//! optionally screen for contradictions, and render a citation-headed
//! context block plus the augmented prompt.

use crate::config::RagConfig;
use crate::ports::chunk_store::{ChunkRepository, ChunkStoreError};
use crate::ports::conflict_store::ConflictRepository;
use crate::ports::embedding::{EmbeddingEngine, EmbeddingError};
use crate::use_cases::detect_conflicts::ConflictDetector;
use council_domain::{
    DetectedConflict, PromptTemplate, RagStats, ScoredChunk, TrustScorer,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why augmentation could not run.
///
/// Fatal to this query's augmentation only: the council falls back to the
/// unaugmented query and proceeds.
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] ChunkStoreError),
}

/// Complete RAG context for one query.
#[derive(Debug, Clone)]
pub struct RagContext {
    pub query: String,
    pub chunks: Vec<ScoredChunk>,
    pub conflicts: Vec<DetectedConflict>,
    pub context_text: String,
    pub conflict_warning: String,
    pub stats: RagStats,
}

impl RagContext {
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Builds augmented prompts from the knowledge base.
pub struct RagContextBuilder {
    embedder: EmbeddingEngine,
    repository: Arc<dyn ChunkRepository>,
    scorer: TrustScorer,
    detector: ConflictDetector,
    conflict_store: Option<Arc<dyn ConflictRepository>>,
    config: RagConfig,
}

impl RagContextBuilder {
    pub fn new(
        embedder: EmbeddingEngine,
        repository: Arc<dyn ChunkRepository>,
        detector: ConflictDetector,
        config: RagConfig,
    ) -> Self {
        let scorer = TrustScorer::new(config.weights, config.recency_decay_days);
        Self {
            embedder,
            repository,
            scorer,
            detector,
            conflict_store: None,
            config,
        }
    }

    /// Persist detected conflicts through the given repository.
    pub fn with_conflict_store(mut self, store: Arc<dyn ConflictRepository>) -> Self {
        self.conflict_store = Some(store);
        self
    }

    /// Build the full context for a query.
    ///
    /// Pipeline: embed -> retrieve `2k` candidates -> drop those under the
    /// similarity threshold -> keep the best `k` -> trust-score -> optional
    /// conflict detection -> render context text under the token budget.
    pub async fn build(
        &self,
        query: &str,
        source_filter: Option<&[u64]>,
        detect_conflicts: bool,
    ) -> Result<RagContext, ContextError> {
        let started = Instant::now();

        let query_vector = self.embedder.embed_query(query).await?;

        // Fetch extra candidates so threshold filtering still fills top_k
        let candidates = self
            .repository
            .search(&query_vector, self.config.top_k * 2, source_filter)
            .await?;

        let total_candidates = candidates.len();
        let eligible: Vec<_> = candidates
            .into_iter()
            .filter(|c| c.similarity >= self.config.similarity_threshold)
            .take(self.config.top_k)
            .map(|c| (c.chunk, c.provenance, c.similarity))
            .collect();
        debug!(
            total_candidates,
            kept = eligible.len(),
            "retrieval candidates filtered"
        );

        let chunks = self.scorer.score_all(eligible);
        let retrieval_ms = started.elapsed().as_millis() as u64;

        let conflict_started = Instant::now();
        let conflicts = if detect_conflicts && chunks.len() >= 2 {
            self.detector.detect(&chunks).await
        } else {
            Vec::new()
        };
        let conflict_detection_ms = conflict_started.elapsed().as_millis() as u64;

        if !conflicts.is_empty() {
            info!("detected {} conflicts between sources", conflicts.len());
            if let Some(store) = &self.conflict_store {
                // Persistence is best-effort; the context is still usable
                if let Err(e) = store.save_conflicts(query, &conflicts).await {
                    warn!("failed to persist conflicts: {e}");
                }
            }
        }

        let context_text = PromptTemplate::context_text(&chunks, self.config.max_context_tokens);
        let conflict_warning = DetectedConflict::format_for_prompt(&conflicts);

        let stats = RagStats {
            chunks_retrieved: chunks.len(),
            sources: distinct_sources(&chunks),
            conflicts_detected: conflicts.len(),
            retrieval_ms,
            conflict_detection_ms,
        };

        Ok(RagContext {
            query: query.to_string(),
            chunks,
            conflicts,
            context_text,
            conflict_warning,
            stats,
        })
    }

    /// Prepend the context block (and conflict warning, when present) to the
    /// original query, with a citation instruction.
    pub fn build_augmented_prompt(&self, original_query: &str, context: &RagContext) -> String {
        PromptTemplate::augmented_prompt(original_query, &context.context_text, &context.conflicts)
    }

    /// The trust scorer in effect (for score explanations).
    pub fn scorer(&self) -> &TrustScorer {
        &self.scorer
    }
}

fn distinct_sources(chunks: &[ScoredChunk]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for chunk in chunks {
        if !sources.contains(&chunk.provenance.source_name) {
            sources.push(chunk.provenance.source_name.clone());
        }
    }
    sources
}
