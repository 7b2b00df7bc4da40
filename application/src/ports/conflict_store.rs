//! Conflict repository port.

use async_trait::async_trait;
use council_domain::DetectedConflict;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConflictStoreError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Optional persistence for detected conflicts.
///
/// The core operates purely on value objects; when a repository is wired in,
/// conflicts found during context building are recorded for later review.
#[async_trait]
pub trait ConflictRepository: Send + Sync {
    async fn save_conflicts(
        &self,
        query: &str,
        conflicts: &[DetectedConflict],
    ) -> Result<(), ConflictStoreError>;
}
