//! Deliberation stages.

use serde::{Deserialize, Serialize};

/// Stage of a council session.
///
/// Linear progression `FirstOpinions -> Review -> FinalResponse -> Complete`;
/// `Failed` is terminal and reachable only when first opinions or the
/// chairman fail entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    FirstOpinions,
    Review,
    FinalResponse,
    Complete,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::FirstOpinions => "first_opinions",
            Stage::Review => "review",
            Stage::FinalResponse => "final_response",
            Stage::Complete => "complete",
            Stage::Failed => "failed",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Stage::FirstOpinions => "First Opinions",
            Stage::Review => "Peer Review",
            Stage::FinalResponse => "Final Response",
            Stage::Complete => "Complete",
            Stage::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Complete | Stage::Failed)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Stage::FirstOpinions).unwrap();
        assert_eq!(json, "\"first_opinions\"");
    }

    #[test]
    fn test_terminal_stages() {
        assert!(Stage::Complete.is_terminal());
        assert!(Stage::Failed.is_terminal());
        assert!(!Stage::Review.is_terminal());
    }
}
