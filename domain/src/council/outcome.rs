//! Complete result of a council session.

use crate::core::model::ModelId;
use crate::council::answer::ModelAnswer;
use crate::council::event::RagStats;
use crate::council::ranking::PeerRanking;
use crate::council::stage::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything a finished deliberation produced.
///
/// Ephemeral: built per query, handed to the caller, never persisted by the
/// core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilOutcome {
    /// The original user query (pre-augmentation)
    pub query: String,
    /// Terminal stage reached (`Complete` or `Failed`)
    pub stage: Stage,
    /// Every member's answer, including failed ones
    pub answers: Vec<ModelAnswer>,
    /// Validated peer rankings (reviewers whose replies parsed)
    pub rankings: Vec<PeerRanking>,
    /// The chairman's synthesized answer, absent on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
    /// The model that synthesized the final answer
    pub chairman: ModelId,
    /// Models that were asked for first opinions
    pub models_used: Vec<ModelId>,
    /// Retrieval statistics when the query was augmented
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rag: Option<RagStats>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CouncilOutcome {
    /// Iterator over only the successful answers.
    pub fn valid_answers(&self) -> impl Iterator<Item = &ModelAnswer> {
        self.answers.iter().filter(|a| a.is_success())
    }

    /// Iterator over only the failed answers.
    pub fn failed_answers(&self) -> impl Iterator<Item = &ModelAnswer> {
        self.answers.iter().filter(|a| !a.is_success())
    }
}
