//! Document ingestion: chunk, embed, and write through the repository.
//!
//! Designed to run as an idempotent unit of work behind a task queue: the
//! whole document's chunk set is replaced on every run, so re-ingesting
//! converges. Embedding failures are local — affected chunks are stored
//! without a vector (unsearchable) and ingestion continues.

use crate::ports::chunk_store::{ChunkRepository, ChunkStoreError, StoredChunk};
use crate::ports::embedding::EmbeddingEngine;
use council_domain::{Chunker, DocumentStatus};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("chunk store error: {0}")]
    Store(#[from] ChunkStoreError),
}

/// One document to ingest.
#[derive(Debug, Clone)]
pub struct DocumentIngest {
    pub document_id: u64,
    pub text: String,
}

/// What an ingestion run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub document_id: u64,
    pub chunks_written: usize,
    pub chunks_embedded: usize,
    /// Chunks stored without a vector after a local embedding failure
    pub chunks_unembedded: usize,
}

/// Ingests one document into the chunk store.
pub struct IngestDocumentUseCase {
    chunker: Chunker,
    embedder: EmbeddingEngine,
    repository: Arc<dyn ChunkRepository>,
}

impl IngestDocumentUseCase {
    pub fn new(
        chunker: Chunker,
        embedder: EmbeddingEngine,
        repository: Arc<dyn ChunkRepository>,
    ) -> Self {
        Self {
            chunker,
            embedder,
            repository,
        }
    }

    /// Chunk and embed `input.text`, then replace the document's chunks.
    ///
    /// An empty document completes with zero chunks rather than failing.
    pub async fn execute(&self, input: DocumentIngest) -> Result<IngestReport, IngestError> {
        let chunks = self.chunker.chunk(&input.text);
        if chunks.is_empty() {
            self.repository
                .replace_document_chunks(input.document_id, Vec::new(), DocumentStatus::Completed)
                .await?;
            return Ok(IngestReport {
                document_id: input.document_id,
                chunks_written: 0,
                chunks_embedded: 0,
                chunks_unembedded: 0,
            });
        }

        let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_all(&contents).await;

        let mut embedded = 0usize;
        let stored: Vec<StoredChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, embedding)| {
                if !embedding.is_empty() {
                    embedded += 1;
                }
                StoredChunk { chunk, embedding }
            })
            .collect();

        let written = stored.len();
        let unembedded = written - embedded;
        if unembedded > 0 {
            warn!(
                document = input.document_id,
                unembedded, "some chunks stored without vectors"
            );
        }

        self.repository
            .replace_document_chunks(input.document_id, stored, DocumentStatus::Completed)
            .await?;

        info!(
            document = input.document_id,
            chunks = written,
            embedded,
            "document ingested"
        );

        Ok(IngestReport {
            document_id: input.document_id,
            chunks_written: written,
            chunks_embedded: embedded,
            chunks_unembedded: unembedded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::chunk_store::{DocumentRecord, RetrievedChunk, SourceRecord};
    use crate::ports::embedding::{EmbeddingError, EmbeddingProvider};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct GoodEmbedder;

    #[async_trait]
    impl EmbeddingProvider for GoodEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![0.1, 0.2]).collect())
        }

        fn max_batch_size(&self) -> usize {
            4
        }
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl EmbeddingProvider for BrokenEmbedder {
        async fn embed_batch(&self, _: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Err(EmbeddingError::Transport("down".into()))
        }

        fn max_batch_size(&self) -> usize {
            4
        }
    }

    #[derive(Default)]
    struct RecordingRepo {
        written: Mutex<Vec<(u64, usize, DocumentStatus)>>,
    }

    #[async_trait]
    impl ChunkRepository for RecordingRepo {
        async fn register_source(&self, _: SourceRecord) -> Result<u64, ChunkStoreError> {
            Ok(1)
        }

        async fn register_document(&self, _: DocumentRecord) -> Result<u64, ChunkStoreError> {
            Ok(1)
        }

        async fn replace_document_chunks(
            &self,
            document_id: u64,
            chunks: Vec<StoredChunk>,
            status: DocumentStatus,
        ) -> Result<(), ChunkStoreError> {
            self.written
                .lock()
                .unwrap()
                .push((document_id, chunks.len(), status));
            Ok(())
        }

        async fn search(
            &self,
            _: &[f32],
            _: usize,
            _: Option<&[u64]>,
        ) -> Result<Vec<RetrievedChunk>, ChunkStoreError> {
            Ok(vec![])
        }
    }

    fn use_case<P: EmbeddingProvider + 'static>(
        provider: P,
        repo: Arc<RecordingRepo>,
    ) -> IngestDocumentUseCase {
        IngestDocumentUseCase::new(
            Chunker::new(64, 8),
            EmbeddingEngine::new(Arc::new(provider)),
            repo,
        )
    }

    #[tokio::test]
    async fn test_ingest_writes_chunks_with_vectors() {
        let repo = Arc::new(RecordingRepo::default());
        let uc = use_case(GoodEmbedder, Arc::clone(&repo));

        let text = (0..10)
            .map(|i| format!("Paragraph {i} carries enough words to fill several chunks."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let report = uc
            .execute(DocumentIngest {
                document_id: 7,
                text,
            })
            .await
            .unwrap();

        assert!(report.chunks_written > 0);
        assert_eq!(report.chunks_embedded, report.chunks_written);
        assert_eq!(report.chunks_unembedded, 0);

        let written = repo.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].0, 7);
        assert_eq!(written[0].2, DocumentStatus::Completed);
    }

    #[tokio::test]
    async fn test_embedding_outage_still_completes() {
        let repo = Arc::new(RecordingRepo::default());
        let uc = use_case(BrokenEmbedder, Arc::clone(&repo));

        let report = uc
            .execute(DocumentIngest {
                document_id: 8,
                text: "A single small paragraph.".to_string(),
            })
            .await
            .unwrap();

        // Chunks written without vectors; ingestion never aborts
        assert_eq!(report.chunks_written, 1);
        assert_eq!(report.chunks_embedded, 0);
        assert_eq!(report.chunks_unembedded, 1);
        assert_eq!(repo.written.lock().unwrap()[0].2, DocumentStatus::Completed);
    }

    #[tokio::test]
    async fn test_empty_document_completes_empty() {
        let repo = Arc::new(RecordingRepo::default());
        let uc = use_case(GoodEmbedder, Arc::clone(&repo));

        let report = uc
            .execute(DocumentIngest {
                document_id: 9,
                text: "   \n\n ".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(report.chunks_written, 0);
        assert_eq!(repo.written.lock().unwrap()[0].1, 0);
    }
}
