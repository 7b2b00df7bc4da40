//! Source and provenance metadata for knowledge-base chunks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of system a document was ingested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Document,
    Notion,
    Github,
    Slack,
    Web,
}

impl SourceType {
    /// Default trust score for this source type, used when the source record
    /// carries no override. Curated documents rank above chat scrollback.
    pub fn default_trust(&self) -> f64 {
        match self {
            SourceType::Document => 0.8,
            SourceType::Notion => 0.7,
            SourceType::Github => 0.6,
            SourceType::Slack => 0.5,
            SourceType::Web => 0.4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Document => "document",
            SourceType::Notion => "notion",
            SourceType::Github => "github",
            SourceType::Slack => "slack",
            SourceType::Web => "web",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "document" => Ok(SourceType::Document),
            "notion" => Ok(SourceType::Notion),
            "github" => Ok(SourceType::Github),
            "slack" => Ok(SourceType::Slack),
            "web" => Ok(SourceType::Web),
            other => Err(format!("unknown source type: {other}")),
        }
    }
}

/// Processing status of an ingested document. Only chunks of `Completed`
/// documents are eligible for retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Where a retrieved chunk came from.
///
/// Carried alongside the chunk through scoring and conflict detection so the
/// final context can cite its sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkProvenance {
    pub chunk_id: u64,
    pub document_id: u64,
    pub source_name: String,
    pub source_type: SourceType,
    pub document_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Per-author authority in [0,1]; 0.5 when unknown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_trust: Option<f64>,
    /// Source-level trust override; falls back to the source type default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_trust_override: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_updated_at: Option<DateTime<Utc>>,
}

impl ChunkProvenance {
    pub fn new(
        chunk_id: u64,
        document_id: u64,
        source_name: impl Into<String>,
        source_type: SourceType,
        document_title: impl Into<String>,
    ) -> Self {
        Self {
            chunk_id,
            document_id,
            source_name: source_name.into(),
            source_type,
            document_title: document_title.into(),
            author: None,
            author_trust: None,
            source_trust_override: None,
            source_updated_at: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>, trust: Option<f64>) -> Self {
        self.author = Some(author.into());
        self.author_trust = trust;
        self
    }

    pub fn with_source_trust(mut self, trust: f64) -> Self {
        self.source_trust_override = Some(trust);
        self
    }

    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.source_updated_at = Some(at);
        self
    }
}
