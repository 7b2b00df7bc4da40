//! Retrieval-augmentation domain
//!
//! Pure logic for the knowledge-base side of the system: splitting documents
//! into token-bounded chunks, trust-weighted scoring of retrieved chunks,
//! cosine similarity, and the conflict value objects produced when two
//! sources contradict each other.
//!
//! Everything here is a pure function of (inputs, config); embedding calls,
//! vector search, and classifier calls live behind application-layer ports.

pub mod chunk;
pub mod chunking;
pub mod conflict;
pub mod scored;
pub mod similarity;
pub mod source;
pub mod trust;

pub use chunk::TextChunk;
pub use chunking::Chunker;
pub use conflict::{ConflictJudgement, ConflictType, DetectedConflict};
pub use scored::ScoredChunk;
pub use similarity::cosine_similarity;
pub use source::{ChunkProvenance, DocumentStatus, SourceType};
pub use trust::{TrustScorer, TrustWeights};
