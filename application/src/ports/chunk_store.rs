//! Chunk repository port: vector search plus the ingestion write path.

use async_trait::async_trait;
use council_domain::{ChunkProvenance, DocumentStatus, SourceType, TextChunk};
use thiserror::Error;

/// Errors from the chunk storage backend.
#[derive(Error, Debug)]
pub enum ChunkStoreError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown source: {0}")]
    UnknownSource(u64),

    #[error("Unknown document: {0}")]
    UnknownDocument(u64),
}

/// A chunk with its embedding, as written by the ingestion path.
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub chunk: TextChunk,
    /// Empty when the chunk could not be embedded; such chunks are stored
    /// but unsearchable.
    pub embedding: Vec<f32>,
}

/// A search hit: the chunk, where it came from, and its raw similarity.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk: TextChunk,
    pub provenance: ChunkProvenance,
    pub similarity: f64,
}

/// Descriptor used when registering a source.
#[derive(Debug, Clone)]
pub struct SourceRecord {
    pub name: String,
    pub source_type: SourceType,
    pub base_trust_score: Option<f64>,
    pub active: bool,
}

/// Descriptor used when registering a document under a source.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub source_id: u64,
    pub title: String,
    pub author: Option<String>,
    pub author_trust: Option<f64>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Read/write access to the chunk store.
///
/// Search is restricted to chunks with embeddings belonging to `Completed`
/// documents of active sources; results come back ordered by similarity
/// descending. Threshold filtering is the caller's responsibility.
#[async_trait]
pub trait ChunkRepository: Send + Sync {
    /// Register a source, returning its id.
    async fn register_source(&self, source: SourceRecord) -> Result<u64, ChunkStoreError>;

    /// Register a document under a source, returning its id.
    async fn register_document(&self, document: DocumentRecord) -> Result<u64, ChunkStoreError>;

    /// Replace a document's chunks wholesale and mark it with `status`.
    ///
    /// Idempotent: re-running ingestion for the same document converges to
    /// the same state.
    async fn replace_document_chunks(
        &self,
        document_id: u64,
        chunks: Vec<StoredChunk>,
        status: DocumentStatus,
    ) -> Result<(), ChunkStoreError>;

    /// Nearest-neighbor search over eligible chunks.
    async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
        source_filter: Option<&[u64]>,
    ) -> Result<Vec<RetrievedChunk>, ChunkStoreError>;
}
