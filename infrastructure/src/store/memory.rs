//! In-memory chunk and conflict stores.
//!
//! Exact-scan stand-ins for the external vector store: brute-force cosine
//! over every eligible chunk. Search honors the same eligibility rules the
//! production store would — embedded chunks only, completed documents only,
//! active sources only, optional source filter.

use async_trait::async_trait;
use council_application::ports::chunk_store::{
    ChunkRepository, ChunkStoreError, DocumentRecord, RetrievedChunk, SourceRecord, StoredChunk,
};
use council_application::ports::conflict_store::{ConflictRepository, ConflictStoreError};
use council_domain::{ChunkProvenance, DetectedConflict, DocumentStatus, cosine_similarity};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::RwLock;

struct DocumentEntry {
    record: DocumentRecord,
    status: DocumentStatus,
    /// (chunk id, stored chunk)
    chunks: Vec<(u64, StoredChunk)>,
}

#[derive(Default)]
struct StoreInner {
    next_source_id: u64,
    next_document_id: u64,
    next_chunk_id: u64,
    sources: HashMap<u64, SourceRecord>,
    documents: HashMap<u64, DocumentEntry>,
}

/// In-memory [`ChunkRepository`] implementation.
#[derive(Default)]
pub struct InMemoryChunkStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks currently stored (all documents).
    pub async fn chunk_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner.documents.values().map(|d| d.chunks.len()).sum()
    }
}

#[async_trait]
impl ChunkRepository for InMemoryChunkStore {
    async fn register_source(&self, source: SourceRecord) -> Result<u64, ChunkStoreError> {
        let mut inner = self.inner.write().await;
        inner.next_source_id += 1;
        let id = inner.next_source_id;
        inner.sources.insert(id, source);
        Ok(id)
    }

    async fn register_document(&self, document: DocumentRecord) -> Result<u64, ChunkStoreError> {
        let mut inner = self.inner.write().await;
        if !inner.sources.contains_key(&document.source_id) {
            return Err(ChunkStoreError::UnknownSource(document.source_id));
        }
        inner.next_document_id += 1;
        let id = inner.next_document_id;
        inner.documents.insert(
            id,
            DocumentEntry {
                record: document,
                status: DocumentStatus::Pending,
                chunks: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn replace_document_chunks(
        &self,
        document_id: u64,
        chunks: Vec<StoredChunk>,
        status: DocumentStatus,
    ) -> Result<(), ChunkStoreError> {
        let mut inner = self.inner.write().await;
        if !inner.documents.contains_key(&document_id) {
            return Err(ChunkStoreError::UnknownDocument(document_id));
        }

        let mut stored = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            inner.next_chunk_id += 1;
            stored.push((inner.next_chunk_id, chunk));
        }

        if let Some(entry) = inner.documents.get_mut(&document_id) {
            entry.chunks = stored;
            entry.status = status;
        }
        Ok(())
    }

    async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
        source_filter: Option<&[u64]>,
    ) -> Result<Vec<RetrievedChunk>, ChunkStoreError> {
        let inner = self.inner.read().await;
        let mut hits: Vec<RetrievedChunk> = Vec::new();

        for (document_id, entry) in &inner.documents {
            if entry.status != DocumentStatus::Completed {
                continue;
            }
            let source_id = entry.record.source_id;
            if let Some(filter) = source_filter
                && !filter.contains(&source_id)
            {
                continue;
            }
            let Some(source) = inner.sources.get(&source_id) else {
                continue;
            };
            if !source.active {
                continue;
            }

            for (chunk_id, stored) in &entry.chunks {
                if stored.embedding.is_empty() {
                    continue;
                }
                let similarity = cosine_similarity(query_vector, &stored.embedding);

                let mut provenance = ChunkProvenance::new(
                    *chunk_id,
                    *document_id,
                    source.name.clone(),
                    source.source_type,
                    entry.record.title.clone(),
                );
                if let Some(trust) = source.base_trust_score {
                    provenance = provenance.with_source_trust(trust);
                }
                if let Some(author) = &entry.record.author {
                    provenance = provenance.with_author(author.clone(), entry.record.author_trust);
                }
                if let Some(updated_at) = entry.record.updated_at {
                    provenance = provenance.with_updated_at(updated_at);
                }

                hits.push(RetrievedChunk {
                    chunk: stored.chunk.clone(),
                    provenance,
                    similarity,
                });
            }
        }

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.provenance.chunk_id.cmp(&b.provenance.chunk_id))
        });
        hits.truncate(limit);
        Ok(hits)
    }
}

/// In-memory [`ConflictRepository`] implementation.
#[derive(Default)]
pub struct InMemoryConflictStore {
    saved: Mutex<Vec<(String, DetectedConflict)>>,
}

impl InMemoryConflictStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }
}

#[async_trait]
impl ConflictRepository for InMemoryConflictStore {
    async fn save_conflicts(
        &self,
        query: &str,
        conflicts: &[DetectedConflict],
    ) -> Result<(), ConflictStoreError> {
        let mut saved = self.saved.lock().unwrap();
        for conflict in conflicts {
            saved.push((query.to_string(), conflict.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{SourceType, TextChunk};

    fn stored(content: &str, embedding: Vec<f32>) -> StoredChunk {
        StoredChunk {
            chunk: TextChunk::new(content, 0, 4),
            embedding,
        }
    }

    async fn seeded_store() -> (InMemoryChunkStore, u64, u64) {
        let store = InMemoryChunkStore::new();
        let source_id = store
            .register_source(SourceRecord {
                name: "handbook".into(),
                source_type: SourceType::Document,
                base_trust_score: None,
                active: true,
            })
            .await
            .unwrap();
        let document_id = store
            .register_document(DocumentRecord {
                source_id,
                title: "Ops Handbook".into(),
                author: Some("ops".into()),
                author_trust: Some(0.8),
                updated_at: None,
            })
            .await
            .unwrap();
        (store, source_id, document_id)
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let (store, _, document_id) = seeded_store().await;
        store
            .replace_document_chunks(
                document_id,
                vec![
                    stored("far", vec![0.0, 1.0]),
                    stored("near", vec![1.0, 0.0]),
                    stored("mid", vec![0.7, 0.7]),
                ],
                DocumentStatus::Completed,
            )
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 10, None).await.unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].chunk.content, "near");
        assert_eq!(hits[1].chunk.content, "mid");
        assert!(hits[0].similarity > hits[1].similarity);
    }

    #[tokio::test]
    async fn test_unembedded_chunks_unsearchable() {
        let (store, _, document_id) = seeded_store().await;
        store
            .replace_document_chunks(
                document_id,
                vec![
                    stored("embedded", vec![1.0, 0.0]),
                    stored("unembedded", vec![]),
                ],
                DocumentStatus::Completed,
            )
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 10, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.content, "embedded");
        // Both chunks are stored, only one is searchable
        assert_eq!(store.chunk_count().await, 2);
    }

    #[tokio::test]
    async fn test_incomplete_documents_excluded() {
        let (store, _, document_id) = seeded_store().await;
        store
            .replace_document_chunks(
                document_id,
                vec![stored("pending", vec![1.0, 0.0])],
                DocumentStatus::Processing,
            )
            .await
            .unwrap();

        assert!(store.search(&[1.0, 0.0], 10, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inactive_source_excluded() {
        let store = InMemoryChunkStore::new();
        let source_id = store
            .register_source(SourceRecord {
                name: "stale".into(),
                source_type: SourceType::Web,
                base_trust_score: None,
                active: false,
            })
            .await
            .unwrap();
        let document_id = store
            .register_document(DocumentRecord {
                source_id,
                title: "Old".into(),
                author: None,
                author_trust: None,
                updated_at: None,
            })
            .await
            .unwrap();
        store
            .replace_document_chunks(
                document_id,
                vec![stored("hidden", vec![1.0, 0.0])],
                DocumentStatus::Completed,
            )
            .await
            .unwrap();

        assert!(store.search(&[1.0, 0.0], 10, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_source_filter() {
        let (store, source_id, document_id) = seeded_store().await;
        store
            .replace_document_chunks(
                document_id,
                vec![stored("visible", vec![1.0, 0.0])],
                DocumentStatus::Completed,
            )
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 10, Some(&[source_id])).await.unwrap();
        assert_eq!(hits.len(), 1);

        let hits = store.search(&[1.0, 0.0], 10, Some(&[source_id + 99])).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_replace_is_idempotent() {
        let (store, _, document_id) = seeded_store().await;
        for _ in 0..3 {
            store
                .replace_document_chunks(
                    document_id,
                    vec![stored("only", vec![1.0, 0.0])],
                    DocumentStatus::Completed,
                )
                .await
                .unwrap();
        }

        assert_eq!(store.chunk_count().await, 1);
        let hits = store.search(&[1.0, 0.0], 10, None).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_document_rejected() {
        let store = InMemoryChunkStore::new();
        let err = store
            .replace_document_chunks(42, vec![], DocumentStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, ChunkStoreError::UnknownDocument(42)));
    }

    #[tokio::test]
    async fn test_conflict_store_records_per_query() {
        use council_domain::rag::conflict::{ConflictSide, ConflictType};

        let store = InMemoryConflictStore::new();
        let conflict = DetectedConflict {
            side_a: ConflictSide {
                chunk_id: 1,
                document_id: 10,
                source_name: "docs".into(),
                author: None,
                content_preview: "limit is 100".into(),
            },
            side_b: ConflictSide {
                chunk_id: 2,
                document_id: 20,
                source_name: "slack".into(),
                author: None,
                content_preview: "limit is 500".into(),
            },
            conflict_type: ConflictType::Numerical,
            confidence: 0.8,
            explanation: "disagree".into(),
            recommendation: "verify".into(),
        };

        store
            .save_conflicts("what is the rate limit?", &[conflict.clone(), conflict])
            .await
            .unwrap();
        assert_eq!(store.saved_count(), 2);
    }

    #[tokio::test]
    async fn test_provenance_carries_source_metadata() {
        let (store, _, document_id) = seeded_store().await;
        store
            .replace_document_chunks(
                document_id,
                vec![stored("content", vec![1.0, 0.0])],
                DocumentStatus::Completed,
            )
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 10, None).await.unwrap();
        let provenance = &hits[0].provenance;
        assert_eq!(provenance.source_name, "handbook");
        assert_eq!(provenance.document_title, "Ops Handbook");
        assert_eq!(provenance.author.as_deref(), Some("ops"));
        assert_eq!(provenance.author_trust, Some(0.8));
    }
}
