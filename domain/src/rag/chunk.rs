//! Text chunks produced during document ingestion.

use serde::{Deserialize, Serialize};

/// A token-bounded slice of a document.
///
/// Chunks are ordered by `chunk_index` within their document; indices are
/// always contiguous starting at 0 (re-indexing is a full replace).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub content: String,
    pub chunk_index: usize,
    pub token_count: usize,
    pub start_char: usize,
    pub end_char: usize,
    /// Title of the section this chunk falls under, inherited from the most
    /// recent heading
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
}

impl TextChunk {
    pub fn new(content: impl Into<String>, chunk_index: usize, token_count: usize) -> Self {
        let content = content.into();
        let end_char = content.len();
        Self {
            content,
            chunk_index,
            token_count,
            start_char: 0,
            end_char,
            section_title: None,
        }
    }

    pub fn with_span(mut self, start_char: usize, end_char: usize) -> Self {
        self.start_char = start_char;
        self.end_char = end_char;
        self
    }

    pub fn with_section(mut self, title: impl Into<String>) -> Self {
        self.section_title = Some(title.into());
        self
    }
}
