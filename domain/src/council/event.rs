//! Streaming events emitted during a council session.
//!
//! [`CouncilEvent`] is the logical streaming protocol between the
//! orchestrator and its caller: a finite, ordered sequence of discriminated
//! records. Wire framing (e.g. newline-delimited JSON) is a caller concern.
//!
//! Ordering guarantees: first-opinion and review records arrive in the order
//! models complete, final-response fragments in generation order, and
//! `Complete` (or a terminal `Error`) is always last.

use crate::core::model::ModelId;
use crate::council::answer::ModelAnswer;
use crate::council::ranking::PeerRanking;
use crate::council::stage::Stage;
use crate::rag::conflict::DetectedConflict;
use serde::{Deserialize, Serialize};

/// Statistics about the retrieval pass that augmented the query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagStats {
    /// Number of chunks that made it into the context
    pub chunks_retrieved: usize,
    /// Distinct source names contributing chunks
    pub sources: Vec<String>,
    /// Number of conflicts detected between sources
    pub conflicts_detected: usize,
    /// Time spent retrieving and scoring
    pub retrieval_ms: u64,
    /// Time spent on conflict classification
    pub conflict_detection_ms: u64,
}

/// Completion metadata for a finished session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilStats {
    pub models_used: Vec<ModelId>,
    pub answers_received: usize,
    pub reviews_received: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rag: Option<RagStats>,
}

/// An event in a streaming council session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouncilEvent {
    /// A stage began; `message` is a short human-readable status line.
    StageUpdate { stage: Stage, message: String },
    /// One member's first opinion (success only; failures arrive as `Error`).
    ModelResponse { answer: ModelAnswer },
    /// One reviewer's validated ranking of the other answers.
    Review { ranking: PeerRanking },
    /// Retrieval summary, emitted before stage 1 when augmentation ran.
    RagContext { stats: RagStats },
    /// A contradiction found between two retrieved sources.
    ConflictDetected { conflict: DetectedConflict },
    /// One fragment of the chairman's synthesized answer.
    FinalResponse { content: String },
    /// A recoverable per-model failure, or (with `fatal`) a terminal one.
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        model: Option<ModelId>,
        message: String,
        fatal: bool,
    },
    /// The session finished; always the last event on success.
    Complete { stats: CouncilStats },
}

impl CouncilEvent {
    /// Returns true if this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CouncilEvent::Complete { .. } | CouncilEvent::Error { fatal: true, .. }
        )
    }

    /// The stage this event belongs to, when it carries one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            CouncilEvent::StageUpdate { stage, .. } => Some(*stage),
            CouncilEvent::ModelResponse { .. } => Some(Stage::FirstOpinions),
            CouncilEvent::Review { .. } => Some(Stage::Review),
            CouncilEvent::FinalResponse { .. } => Some(Stage::FinalResponse),
            CouncilEvent::Complete { .. } => Some(Stage::Complete),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_is_terminal() {
        let event = CouncilEvent::Complete {
            stats: CouncilStats {
                models_used: vec![],
                answers_received: 0,
                reviews_received: 0,
                rag: None,
            },
        };
        assert!(event.is_terminal());
        assert_eq!(event.stage(), Some(Stage::Complete));
    }

    #[test]
    fn test_recoverable_error_is_not_terminal() {
        let event = CouncilEvent::Error {
            model: Some(ModelId::new("gpt-5.2")),
            message: "Timeout".into(),
            fatal: false,
        };
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_serde_tagging() {
        let event = CouncilEvent::FinalResponse {
            content: "chunk".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"final_response\""));
    }
}
