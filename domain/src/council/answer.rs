//! First-opinion answers from council members.

use crate::core::model::ModelId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response from a single model in the first-opinions stage.
///
/// A per-model failure is recorded here instead of aborting the session:
/// the answer carries an `error` and empty content, and later stages simply
/// skip it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelAnswer {
    /// The model that generated this answer
    pub model: ModelId,
    /// The answer content (empty on failure)
    pub content: String,
    /// When the answer (or failure) was recorded
    pub timestamp: DateTime<Utc>,
    /// Error message if the model failed to respond
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelAnswer {
    /// Creates a successful answer from a model.
    pub fn success(model: impl Into<ModelId>, content: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            content: content.into(),
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Creates a failed answer indicating the model could not respond.
    pub fn failure(model: impl Into<ModelId>, error: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            content: String::new(),
            timestamp: Utc::now(),
            error: Some(error.into()),
        }
    }

    /// Returns `true` if this answer was generated successfully.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
