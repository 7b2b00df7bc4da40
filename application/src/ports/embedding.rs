//! Embedding provider port and the batching engine on top of it.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

/// Errors from the embedding backend.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider returned status {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),
}

/// Converts text into fixed-dimension vectors.
///
/// Implementations promise the output has the same length and order as the
/// input. The batch size the provider accepts is exposed so the engine can
/// split work.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one batch of texts; `texts.len()` never exceeds
    /// [`max_batch_size`](Self::max_batch_size).
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Largest batch the backend accepts in one call.
    fn max_batch_size(&self) -> usize;
}

/// Batching layer over an [`EmbeddingProvider`].
///
/// Splits input to the provider's batch limit and isolates failures: when a
/// batch fails, its entries become empty vectors (unembeddable) while the
/// remaining batches continue. Embedding failure is local and never aborts
/// ingestion of a whole document. Blank texts are never sent to the backend.
pub struct EmbeddingEngine {
    provider: std::sync::Arc<dyn EmbeddingProvider>,
}

impl EmbeddingEngine {
    pub fn new(provider: std::sync::Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Embed all texts, preserving input order and length.
    pub async fn embed_all(&self, texts: &[String]) -> Vec<Vec<f32>> {
        if texts.is_empty() {
            return Vec::new();
        }

        let mut results: Vec<Vec<f32>> = vec![Vec::new(); texts.len()];

        // Only non-blank texts go to the backend
        let valid: Vec<(usize, String)> = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.trim().is_empty())
            .map(|(i, t)| (i, t.clone()))
            .collect();

        let batch_size = self.provider.max_batch_size().max(1);

        for batch in valid.chunks(batch_size) {
            let contents: Vec<String> = batch.iter().map(|(_, t)| t.clone()).collect();
            match self.provider.embed_batch(&contents).await {
                Ok(vectors) if vectors.len() == contents.len() => {
                    for ((index, _), vector) in batch.iter().zip(vectors) {
                        results[*index] = vector;
                    }
                }
                Ok(vectors) => {
                    warn!(
                        expected = contents.len(),
                        got = vectors.len(),
                        "embedding batch returned wrong cardinality, dropping batch"
                    );
                }
                Err(e) => {
                    warn!("embedding batch failed, continuing without vectors: {e}");
                }
            }
        }

        results
    }

    /// Embed a single query string.
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbeddingError> {
        let vectors = self.provider.embed_batch(&[query.to_string()]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::MalformedResponse("empty embedding batch".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider that fails every `fail_batch`-th call.
    struct FlakyProvider {
        calls: AtomicUsize,
        fail_batch: usize,
        batch_size: usize,
    }

    #[async_trait]
    impl EmbeddingProvider for FlakyProvider {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == self.fail_batch {
                return Err(EmbeddingError::Transport("connection reset".into()));
            }
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn max_batch_size(&self) -> usize {
            self.batch_size
        }
    }

    #[tokio::test]
    async fn test_batch_failure_is_local() {
        let engine = EmbeddingEngine::new(std::sync::Arc::new(FlakyProvider {
            calls: AtomicUsize::new(0),
            fail_batch: 1,
            batch_size: 2,
        }));
        let texts: Vec<String> = (0..6).map(|i| format!("text {i}")).collect();
        let vectors = engine.embed_all(&texts).await;

        assert_eq!(vectors.len(), 6);
        // Batch 0 (indices 0,1) and batch 2 (indices 4,5) succeeded
        assert!(!vectors[0].is_empty());
        assert!(!vectors[1].is_empty());
        // Batch 1 (indices 2,3) failed -> empty vectors
        assert!(vectors[2].is_empty());
        assert!(vectors[3].is_empty());
        assert!(!vectors[4].is_empty());
        assert!(!vectors[5].is_empty());
    }

    #[tokio::test]
    async fn test_blank_texts_skip_backend() {
        let engine = EmbeddingEngine::new(std::sync::Arc::new(FlakyProvider {
            calls: AtomicUsize::new(0),
            fail_batch: usize::MAX,
            batch_size: 10,
        }));
        let texts = vec!["real".to_string(), "   ".to_string(), "also real".to_string()];
        let vectors = engine.embed_all(&texts).await;

        assert_eq!(vectors.len(), 3);
        assert!(!vectors[0].is_empty());
        assert!(vectors[1].is_empty());
        assert!(!vectors[2].is_empty());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let engine = EmbeddingEngine::new(std::sync::Arc::new(FlakyProvider {
            calls: AtomicUsize::new(0),
            fail_batch: usize::MAX,
            batch_size: 10,
        }));
        assert!(engine.embed_all(&[]).await.is_empty());
    }
}
