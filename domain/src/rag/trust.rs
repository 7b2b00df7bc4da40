//! Trust-weighted scoring of retrieved chunks.
//!
//! The final score of a candidate is
//!
//! ```text
//! final = w_sim * similarity
//!       + w_trust * source_trust
//!       + w_recency * recency
//!       + w_author * author_authority
//! ```
//!
//! with the four weights normalized to sum to 1 at construction, so the
//! final score stays in [0,1] whenever the components do.

use crate::rag::chunk::TextChunk;
use crate::rag::scored::ScoredChunk;
use crate::rag::source::ChunkProvenance;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author authority used when a chunk carries no author signal.
const DEFAULT_AUTHOR_TRUST: f64 = 0.5;
/// Recency used when the source's update time is unknown.
const UNKNOWN_RECENCY: f64 = 0.5;

/// Relative weights of the four scoring components.
///
/// Raw values are normalized by [`TrustWeights::normalized`]; an all-zero
/// vector falls back to the defaults rather than dividing by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustWeights {
    pub similarity: f64,
    pub source_trust: f64,
    pub recency: f64,
    pub authority: f64,
}

impl TrustWeights {
    pub fn new(similarity: f64, source_trust: f64, recency: f64, authority: f64) -> Self {
        Self {
            similarity,
            source_trust,
            recency,
            authority,
        }
    }

    /// Scale the weights so they sum to exactly 1.
    pub fn normalized(self) -> Self {
        let total = self.similarity + self.source_trust + self.recency + self.authority;
        if total <= 0.0 {
            return Self::default().normalized();
        }
        Self {
            similarity: self.similarity / total,
            source_trust: self.source_trust / total,
            recency: self.recency / total,
            authority: self.authority / total,
        }
    }

    pub fn sum(&self) -> f64 {
        self.similarity + self.source_trust + self.recency + self.authority
    }
}

impl Default for TrustWeights {
    /// Similarity dominates; trust and recency matter; authority nudges.
    fn default() -> Self {
        Self {
            similarity: 0.5,
            source_trust: 0.2,
            recency: 0.2,
            authority: 0.1,
        }
    }
}

/// Computes trust-weighted scores for retrieval candidates.
///
/// Pure function of (inputs, config): no clocks are read during scoring
/// except to age recency, and [`TrustScorer::score_all_at`] pins that too.
#[derive(Debug, Clone)]
pub struct TrustScorer {
    weights: TrustWeights,
    recency_decay_days: f64,
}

impl TrustScorer {
    pub fn new(weights: TrustWeights, recency_decay_days: u32) -> Self {
        Self {
            weights: weights.normalized(),
            recency_decay_days: f64::from(recency_decay_days.max(1)),
        }
    }

    /// The normalized weights in effect.
    pub fn weights(&self) -> TrustWeights {
        self.weights
    }

    /// Score a batch of candidates and sort by final score descending.
    ///
    /// Ties are broken by ascending chunk id so the ordering is
    /// deterministic regardless of input order.
    pub fn score_all(
        &self,
        candidates: Vec<(TextChunk, ChunkProvenance, f64)>,
    ) -> Vec<ScoredChunk> {
        self.score_all_at(candidates, Utc::now())
    }

    /// As [`score_all`](Self::score_all) with an explicit "now" for recency.
    pub fn score_all_at(
        &self,
        candidates: Vec<(TextChunk, ChunkProvenance, f64)>,
        now: DateTime<Utc>,
    ) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = candidates
            .into_iter()
            .map(|(chunk, provenance, similarity)| self.score_at(chunk, provenance, similarity, now))
            .collect();

        scored.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk_id().cmp(&b.chunk_id()))
        });
        scored
    }

    fn score_at(
        &self,
        chunk: TextChunk,
        provenance: ChunkProvenance,
        similarity: f64,
        now: DateTime<Utc>,
    ) -> ScoredChunk {
        let source_trust = provenance
            .source_trust_override
            .unwrap_or_else(|| provenance.source_type.default_trust());
        let recency = self.recency_score(provenance.source_updated_at, now);
        let authority = provenance.author_trust.unwrap_or(DEFAULT_AUTHOR_TRUST);

        let final_score = self.weights.similarity * similarity
            + self.weights.source_trust * source_trust
            + self.weights.recency * recency
            + self.weights.authority * authority;

        ScoredChunk {
            chunk,
            provenance,
            similarity_score: similarity,
            source_trust_score: source_trust,
            recency_score: recency,
            author_authority_score: authority,
            final_score,
        }
    }

    /// Exponential decay over document age, clamped to [0.1, 1.0].
    fn recency_score(&self, updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
        let Some(updated_at) = updated_at else {
            return UNKNOWN_RECENCY;
        };
        let age_days = (now - updated_at).num_days().max(0) as f64;
        (-age_days / self.recency_decay_days).exp().clamp(0.1, 1.0)
    }

    /// Human-readable breakdown of one scored chunk.
    pub fn explain(&self, scored: &ScoredChunk) -> String {
        format!(
            "Score breakdown for '{}':\n\
             \x20 - Similarity: {:.3} (weight: {:.0}%)\n\
             \x20 - Source Trust ({}): {:.3} (weight: {:.0}%)\n\
             \x20 - Recency: {:.3} (weight: {:.0}%)\n\
             \x20 - Author Authority: {:.3} (weight: {:.0}%)\n\
             \x20 Final Score: {:.3}",
            scored.provenance.document_title,
            scored.similarity_score,
            self.weights.similarity * 100.0,
            scored.provenance.source_type,
            scored.source_trust_score,
            self.weights.source_trust * 100.0,
            scored.recency_score,
            self.weights.recency * 100.0,
            scored.author_authority_score,
            self.weights.authority * 100.0,
            scored.final_score,
        )
    }
}

impl Default for TrustScorer {
    fn default() -> Self {
        Self::new(TrustWeights::default(), 365)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::source::SourceType;
    use chrono::Duration;

    fn candidate(
        chunk_id: u64,
        document_id: u64,
        source_type: SourceType,
    ) -> (TextChunk, ChunkProvenance, f64) {
        (
            TextChunk::new("content", 0, 2),
            ChunkProvenance::new(chunk_id, document_id, "src", source_type, "Doc"),
            0.9,
        )
    }

    #[test]
    fn test_weights_normalize_to_one() {
        let weights = TrustWeights::new(2.0, 1.0, 1.0, 1.0).normalized();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
        assert!((weights.similarity - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_zero_weights_fall_back_to_defaults() {
        let weights = TrustWeights::new(0.0, 0.0, 0.0, 0.0).normalized();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
        assert!(weights.similarity > 0.0);
    }

    #[test]
    fn test_final_score_in_unit_interval() {
        let scorer = TrustScorer::default();
        let now = Utc::now();
        for sim in [0.0, 0.3, 1.0] {
            let (chunk, provenance, _) = candidate(1, 1, SourceType::Web);
            let scored = scorer.score_all_at(vec![(chunk, provenance, sim)], now);
            assert!((0.0..=1.0).contains(&scored[0].final_score));
        }
    }

    #[test]
    fn test_unknown_update_time_defaults_recency() {
        let scorer = TrustScorer::default();
        let (chunk, provenance, sim) = candidate(1, 1, SourceType::Document);
        let scored = scorer.score_all_at(vec![(chunk, provenance, sim)], Utc::now());
        assert_eq!(scored[0].recency_score, UNKNOWN_RECENCY);
    }

    #[test]
    fn test_recency_decay_clamped() {
        let scorer = TrustScorer::new(TrustWeights::default(), 30);
        let now = Utc::now();

        let (chunk, provenance, sim) = candidate(1, 1, SourceType::Document);
        let fresh = provenance.with_updated_at(now);
        let scored = scorer.score_all_at(vec![(chunk, fresh, sim)], now);
        assert!((scored[0].recency_score - 1.0).abs() < 1e-9);

        let (chunk, provenance, sim) = candidate(2, 1, SourceType::Document);
        let ancient = provenance.with_updated_at(now - Duration::days(10_000));
        let scored = scorer.score_all_at(vec![(chunk, ancient, sim)], now);
        assert_eq!(scored[0].recency_score, 0.1);
    }

    #[test]
    fn test_source_trust_override_wins() {
        let scorer = TrustScorer::default();
        let (chunk, provenance, sim) = candidate(1, 1, SourceType::Web);
        let overridden = provenance.with_source_trust(0.95);
        let scored = scorer.score_all_at(vec![(chunk, overridden, sim)], Utc::now());
        assert_eq!(scored[0].source_trust_score, 0.95);
    }

    #[test]
    fn test_ordering_desc_with_chunk_id_tiebreak() {
        let scorer = TrustScorer::default();
        let now = Utc::now();
        // Identical inputs except chunk id -> identical final score
        let scored = scorer.score_all_at(
            vec![
                candidate(7, 1, SourceType::Document),
                candidate(3, 2, SourceType::Document),
                candidate(5, 3, SourceType::Web),
            ],
            now,
        );
        // Web scores below the two document candidates
        assert_eq!(scored[2].chunk_id(), 5);
        // Tie between 7 and 3 resolves ascending by id
        assert_eq!(scored[0].chunk_id(), 3);
        assert_eq!(scored[1].chunk_id(), 7);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let scorer = TrustScorer::new(TrustWeights::new(3.0, 1.0, 1.0, 1.0), 200);
        let now = Utc::now();
        let run = |scorer: &TrustScorer| {
            scorer.score_all_at(
                vec![
                    candidate(1, 1, SourceType::Slack),
                    candidate(2, 2, SourceType::Github),
                    candidate(3, 3, SourceType::Document),
                ],
                now,
            )
        };
        let first = run(&scorer);
        let second = run(&scorer);
        let ids = |v: &[ScoredChunk]| v.iter().map(|c| c.chunk_id()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.final_score, b.final_score);
        }
    }

    #[test]
    fn test_explain_mentions_components() {
        let scorer = TrustScorer::default();
        let (chunk, provenance, sim) = candidate(1, 1, SourceType::Document);
        let scored = scorer.score_all_at(vec![(chunk, provenance, sim)], Utc::now());
        let explanation = scorer.explain(&scored[0]);
        assert!(explanation.contains("Similarity"));
        assert!(explanation.contains("Source Trust"));
        assert!(explanation.contains("Final Score"));
    }
}
