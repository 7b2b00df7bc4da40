//! Council deliberation domain
//!
//! The council runs a three-stage protocol:
//!
//! 1. **First opinions** — every member answers the query independently.
//! 2. **Review** — each valid responder ranks the other answers, presented
//!    anonymously behind deterministic letters.
//! 3. **Final response** — a designated chairman synthesizes one answer from
//!    all opinions and rankings.
//!
//! This module holds the immutable value objects produced by each stage and
//! the pure logic around them (anonymization, ranking validation, reply
//! parsing). Orchestration lives in the application layer.

pub mod anonymize;
pub mod answer;
pub mod event;
pub mod outcome;
pub mod ranking;
pub mod review_reply;
pub mod stage;

pub use anonymize::AnonymizedPanel;
pub use answer::ModelAnswer;
pub use event::{CouncilEvent, CouncilStats, RagStats};
pub use outcome::CouncilOutcome;
pub use ranking::{PeerRanking, RankingEntry, RankingError};
pub use review_reply::parse_review_reply;
pub use stage::Stage;
