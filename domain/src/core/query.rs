//! Query value object

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// A user query to be deliberated by the council (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    content: String,
}

impl Query {
    /// Create a new query
    ///
    /// # Panics
    /// Panics if the content is empty or only whitespace
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        assert!(!content.trim().is_empty(), "Query cannot be empty");
        Self { content }
    }

    /// Try to create a new query, returning None if invalid
    pub fn try_new(content: impl Into<String>) -> Option<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            None
        } else {
            Some(Self { content })
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

impl std::str::FromStr for Query {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Query::try_new(s)
            .ok_or_else(|| DomainError::InvalidQuery("query cannot be empty".to_string()))
    }
}

impl From<&str> for Query {
    fn from(s: &str) -> Self {
        Query::new(s)
    }
}

impl From<String> for Query {
    fn from(s: String) -> Self {
        Query::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_creation() {
        let q = Query::new("What is the deployment process?");
        assert_eq!(q.content(), "What is the deployment process?");
    }

    #[test]
    fn test_try_new_rejects_blank() {
        assert!(Query::try_new("   ").is_none());
        assert!(Query::try_new("ok").is_some());
    }

    #[test]
    #[should_panic(expected = "Query cannot be empty")]
    fn test_new_panics_on_blank() {
        let _ = Query::new("");
    }

    #[test]
    fn test_parse_rejects_blank() {
        let err = " \t ".parse::<Query>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidQuery(_)));
        assert!("fine".parse::<Query>().is_ok());
    }
}
