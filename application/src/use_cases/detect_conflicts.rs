//! LLM-based pairwise conflict detection over retrieved chunks.

use crate::config::ConflictConfig;
use crate::ports::llm_gateway::{ChatMessage, GenerationParams, LlmGateway};
use council_domain::rag::conflict::ConflictSide;
use council_domain::{
    ConflictType, DetectedConflict, PromptTemplate, ScoredChunk, parse_conflict_judgement,
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Detects contradictions between top-scored chunks.
///
/// Candidate pairs are only formed between chunks from *different* source
/// documents; the total number of comparisons is capped. Comparisons run
/// concurrently and independently — a failed classifier call skips that
/// pair, never the batch.
pub struct ConflictDetector {
    gateway: Arc<dyn LlmGateway>,
    config: ConflictConfig,
}

impl ConflictDetector {
    pub fn new(gateway: Arc<dyn LlmGateway>, config: ConflictConfig) -> Self {
        Self { gateway, config }
    }

    /// Compare the top chunks pairwise and return conflicts above the
    /// confidence threshold, ordered by (chunk_a, chunk_b) ids.
    pub async fn detect(&self, chunks: &[ScoredChunk]) -> Vec<DetectedConflict> {
        let top = &chunks[..chunks.len().min(self.config.check_top_n)];
        if top.len() < 2 {
            return Vec::new();
        }

        let mut pairs: Vec<(ScoredChunk, ScoredChunk)> = Vec::new();
        for (i, a) in top.iter().enumerate() {
            for b in &top[i + 1..] {
                if a.document_id() == b.document_id() {
                    continue;
                }
                pairs.push((a.clone(), b.clone()));
            }
        }
        pairs.truncate(self.config.max_comparisons);

        if pairs.is_empty() {
            return Vec::new();
        }
        debug!("comparing {} chunk pairs for conflicts", pairs.len());

        let mut join_set = JoinSet::new();
        for (a, b) in pairs {
            let gateway = Arc::clone(&self.gateway);
            let config = self.config.clone();
            join_set.spawn(async move { Self::compare_pair(&*gateway, &config, &a, &b).await });
        }

        let mut conflicts = Vec::new();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(Some(conflict)) if conflict.confidence >= self.config.confidence_threshold => {
                    conflicts.push(conflict);
                }
                Ok(Some(conflict)) => {
                    debug!(
                        confidence = conflict.confidence,
                        "conflict below threshold, dropping"
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("conflict comparison task failed: {e}");
                }
            }
        }

        // Gathering order is nondeterministic; fix it
        conflicts.sort_by_key(|c| (c.side_a.chunk_id, c.side_b.chunk_id));
        conflicts
    }

    async fn compare_pair(
        gateway: &dyn LlmGateway,
        config: &ConflictConfig,
        a: &ScoredChunk,
        b: &ScoredChunk,
    ) -> Option<DetectedConflict> {
        let prompt = PromptTemplate::conflict_prompt(
            &a.citation(),
            truncate(&a.chunk.content, config.max_passage_chars),
            &b.citation(),
            truncate(&b.chunk.content, config.max_passage_chars),
        );
        let messages = [
            ChatMessage::system(PromptTemplate::conflict_system()),
            ChatMessage::user(prompt),
        ];
        // Low temperature for consistent analysis
        let params = GenerationParams::default()
            .with_temperature(0.1)
            .with_max_tokens(500);

        let reply = match gateway.generate(&config.model, &messages, params).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    chunk_a = a.chunk_id(),
                    chunk_b = b.chunk_id(),
                    "conflict classifier call failed: {e}"
                );
                return None;
            }
        };

        let judgement = match parse_conflict_judgement(&reply) {
            Some(judgement) => judgement,
            None => {
                warn!(
                    chunk_a = a.chunk_id(),
                    chunk_b = b.chunk_id(),
                    "unparsable classifier reply, skipping pair"
                );
                return None;
            }
        };

        if !judgement.has_conflict {
            return None;
        }

        Some(DetectedConflict {
            side_a: ConflictSide::from_scored(a),
            side_b: ConflictSide::from_scored(b),
            conflict_type: ConflictType::parse_lenient(
                judgement.conflict_type.as_deref().unwrap_or(""),
            ),
            confidence: judgement.confidence.unwrap_or(0.5).clamp(0.0, 1.0),
            explanation: judgement.explanation.unwrap_or_default(),
            recommendation: judgement
                .recommendation
                .unwrap_or_else(|| "Verify with authoritative source".to_string()),
        })
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
