//! Trust-scored retrieval results.

use crate::rag::chunk::TextChunk;
use crate::rag::source::ChunkProvenance;
use serde::{Deserialize, Serialize};

/// A retrieved chunk with its full scoring breakdown.
///
/// Recomputed on every query; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: TextChunk,
    pub provenance: ChunkProvenance,
    pub similarity_score: f64,
    pub source_trust_score: f64,
    pub recency_score: f64,
    pub author_authority_score: f64,
    /// Weighted combination of the four components, in [0,1]
    pub final_score: f64,
}

impl ScoredChunk {
    pub fn chunk_id(&self) -> u64 {
        self.provenance.chunk_id
    }

    pub fn document_id(&self) -> u64 {
        self.provenance.document_id
    }

    /// Citation line used in context building and conflict prompts.
    pub fn citation(&self) -> String {
        let mut cite = format!(
            "{} - {}",
            self.provenance.source_name, self.provenance.document_title
        );
        if let Some(section) = &self.chunk.section_title {
            cite.push_str(" - ");
            cite.push_str(section);
        }
        cite
    }
}
