//! Peer rankings produced in the review stage.

use crate::core::model::ModelId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One reviewed answer within a [`PeerRanking`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// The model whose answer was ranked (resolved from its anonymous letter)
    pub model: ModelId,
    /// Position assigned by the reviewer, 1 = best
    pub rank: u32,
    /// The reviewer's reasoning for this position
    pub reasoning: String,
}

/// Validation failures for a reviewer's ranking list.
///
/// Any of these rejects the whole review; a partially-valid ranking is never
/// kept.
#[derive(Error, Debug, PartialEq)]
pub enum RankingError {
    #[error("reviewer {0} ranked its own answer")]
    SelfRanking(ModelId),

    #[error("duplicate rank {0} in ranking list")]
    DuplicateRank(u32),

    #[error("ranks must cover 1..={expected}, got {got:?}")]
    IncompleteRanks { expected: u32, got: Vec<u32> },

    #[error("ranking list is empty")]
    Empty,
}

/// A reviewer's complete, validated ranking of the other answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerRanking {
    /// The model that performed the review
    pub reviewer: ModelId,
    /// Ranked answers, best first
    pub entries: Vec<RankingEntry>,
    /// When the review was recorded
    pub timestamp: DateTime<Utc>,
}

impl PeerRanking {
    /// Build a ranking after validating the entry list.
    ///
    /// Rules:
    /// - at least one entry
    /// - no entry may rank the reviewer itself (self-exclusion)
    /// - ranks must be exactly `1..=entries.len()` with no duplicates
    ///
    /// Entries are sorted by rank ascending on success.
    pub fn new(
        reviewer: impl Into<ModelId>,
        mut entries: Vec<RankingEntry>,
    ) -> Result<Self, RankingError> {
        let reviewer = reviewer.into();

        if entries.is_empty() {
            return Err(RankingError::Empty);
        }

        if entries.iter().any(|e| e.model == reviewer) {
            return Err(RankingError::SelfRanking(reviewer));
        }

        let mut ranks: Vec<u32> = entries.iter().map(|e| e.rank).collect();
        ranks.sort_unstable();
        for window in ranks.windows(2) {
            if window[0] == window[1] {
                return Err(RankingError::DuplicateRank(window[0]));
            }
        }
        let expected = entries.len() as u32;
        if ranks.first() != Some(&1) || ranks.last() != Some(&expected) {
            return Err(RankingError::IncompleteRanks {
                expected,
                got: ranks,
            });
        }

        entries.sort_by_key(|e| e.rank);

        Ok(Self {
            reviewer,
            entries,
            timestamp: Utc::now(),
        })
    }

    /// The model this reviewer placed first.
    pub fn top_choice(&self) -> &ModelId {
        // entries are sorted and non-empty by construction
        &self.entries[0].model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(model: &str, rank: u32) -> RankingEntry {
        RankingEntry {
            model: model.into(),
            rank,
            reasoning: String::new(),
        }
    }

    #[test]
    fn test_valid_ranking_sorted_by_rank() {
        let ranking = PeerRanking::new("judge", vec![entry("b", 2), entry("a", 1)]).unwrap();
        assert_eq!(ranking.top_choice(), &ModelId::new("a"));
        assert_eq!(ranking.entries[1].model, ModelId::new("b"));
    }

    #[test]
    fn test_self_ranking_rejected() {
        let err = PeerRanking::new("judge", vec![entry("judge", 1)]).unwrap_err();
        assert_eq!(err, RankingError::SelfRanking(ModelId::new("judge")));
    }

    #[test]
    fn test_duplicate_rank_rejected() {
        let err =
            PeerRanking::new("judge", vec![entry("a", 1), entry("b", 1)]).unwrap_err();
        assert_eq!(err, RankingError::DuplicateRank(1));
    }

    #[test]
    fn test_missing_rank_rejected() {
        let err =
            PeerRanking::new("judge", vec![entry("a", 1), entry("b", 3)]).unwrap_err();
        assert!(matches!(err, RankingError::IncompleteRanks { expected: 2, .. }));
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(
            PeerRanking::new("judge", vec![]).unwrap_err(),
            RankingError::Empty
        );
    }
}
