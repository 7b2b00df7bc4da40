//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("No models configured for the council")]
    NoModels,

    #[error("all models failed to respond")]
    AllModelsFailed,

    #[error("Chairman model failed: {0}")]
    ChairmanFailed(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_models_failed_display() {
        let error = DomainError::AllModelsFailed;
        assert_eq!(error.to_string(), "all models failed to respond");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::NoModels.is_cancelled());
        assert!(!DomainError::AllModelsFailed.is_cancelled());
    }
}
