//! Conflicts detected between knowledge-base sources.
//!
//! A conflict is a contradiction between two chunks from *different*
//! documents, classified by an LLM into a fixed taxonomy. This module holds
//! the value objects and the pure parts: classifier-reply parsing and report
//! formatting. Driving the classifier lives in the application layer.

use crate::rag::scored::ScoredChunk;
use serde::{Deserialize, Serialize};

/// Fixed conflict taxonomy. Unrecognized classifier output maps to
/// [`ConflictType::Factual`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    Factual,
    Temporal,
    Opinion,
    Numerical,
    Procedural,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictType::Factual => "factual",
            ConflictType::Temporal => "temporal",
            ConflictType::Opinion => "opinion",
            ConflictType::Numerical => "numerical",
            ConflictType::Procedural => "procedural",
        }
    }

    /// Lenient parse: the classifier is prompted for exact labels but not
    /// trusted to produce them.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "temporal" => ConflictType::Temporal,
            "opinion" => ConflictType::Opinion,
            "numerical" => ConflictType::Numerical,
            "procedural" => ConflictType::Procedural,
            _ => ConflictType::Factual,
        }
    }
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One side of a detected conflict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictSide {
    pub chunk_id: u64,
    pub document_id: u64,
    pub source_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Leading slice of the chunk content, for display and prompts
    pub content_preview: String,
}

impl ConflictSide {
    const PREVIEW_CHARS: usize = 300;

    pub fn from_scored(chunk: &ScoredChunk) -> Self {
        Self {
            chunk_id: chunk.chunk_id(),
            document_id: chunk.document_id(),
            source_name: chunk.provenance.source_name.clone(),
            author: chunk.provenance.author.clone(),
            content_preview: truncate_chars(&chunk.chunk.content, Self::PREVIEW_CHARS),
        }
    }
}

/// A contradiction between two chunks from different source documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedConflict {
    pub side_a: ConflictSide,
    pub side_b: ConflictSide,
    pub conflict_type: ConflictType,
    /// Classifier confidence in [0,1]
    pub confidence: f64,
    pub explanation: String,
    pub recommendation: String,
}

impl DetectedConflict {
    /// Format all conflicts as a warning block for inclusion in an LLM
    /// prompt, instructing the consumer to surface the discrepancy.
    pub fn format_for_prompt(conflicts: &[DetectedConflict]) -> String {
        if conflicts.is_empty() {
            return String::new();
        }

        let mut lines = vec![
            "\n[IMPORTANT: The following conflicts were detected in the source material. \
             Be sure to acknowledge these discrepancies in your response and suggest \
             how the user might resolve them.]\n"
                .to_string(),
        ];

        for conflict in conflicts {
            lines.push(format!(
                "- {} conflict (confidence: {:.0}%): {}",
                conflict.conflict_type.as_str().to_uppercase(),
                conflict.confidence * 100.0,
                conflict.explanation
            ));
            lines.push(format!(
                "  Source A ({}): {}",
                conflict.side_a.source_name,
                truncate_chars(&conflict.side_a.content_preview, 150)
            ));
            lines.push(format!(
                "  Source B ({}): {}",
                conflict.side_b.source_name,
                truncate_chars(&conflict.side_b.content_preview, 150)
            ));
            lines.push(format!("  Recommendation: {}", conflict.recommendation));
            lines.push(String::new());
        }

        lines.join("\n")
    }

    /// Human-readable conflict report for console display.
    pub fn format_report(conflicts: &[DetectedConflict]) -> String {
        if conflicts.is_empty() {
            return String::new();
        }

        let mut parts = vec![
            "CONFLICTING INFORMATION DETECTED".to_string(),
            "=".repeat(50),
        ];

        for (i, conflict) in conflicts.iter().enumerate() {
            parts.push(format!(
                "\nConflict #{} ({})",
                i + 1,
                conflict.conflict_type.as_str().to_uppercase()
            ));
            parts.push(format!("Confidence: {:.0}%", conflict.confidence * 100.0));
            parts.push("-".repeat(30));

            for (label, side) in [("A", &conflict.side_a), ("B", &conflict.side_b)] {
                parts.push(format!("\nSource {} ({}):", label, side.source_name));
                if let Some(author) = &side.author {
                    parts.push(format!("   Author: {author}"));
                }
                parts.push(format!("   \"{}\"", side.content_preview));
            }

            parts.push(format!("\nAnalysis: {}", conflict.explanation));
            parts.push(format!("Recommendation: {}", conflict.recommendation));
            parts.push("-".repeat(30));
        }

        parts.join("\n")
    }
}

/// The classifier's JSON verdict on one pair of passages.
#[derive(Debug, Clone, Deserialize)]
pub struct ConflictJudgement {
    pub has_conflict: bool,
    #[serde(default)]
    pub conflict_type: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub recommendation: Option<String>,
}

/// Parse a classifier reply, tolerating markdown fences and surrounding
/// prose. Returns `None` when no JSON object can be extracted or it fails
/// the schema — the caller skips the pair.
pub fn parse_conflict_judgement(reply: &str) -> Option<ConflictJudgement> {
    let trimmed = reply.trim();
    let body = if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        rest.split("```").next()?.trim()
    } else {
        trimmed
    };

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&body[start..=end]).ok()
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max).collect();
        out.push_str("...");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lenient_defaults_to_factual() {
        assert_eq!(ConflictType::parse_lenient("numerical"), ConflictType::Numerical);
        assert_eq!(ConflictType::parse_lenient("NUMERICAL"), ConflictType::Numerical);
        assert_eq!(ConflictType::parse_lenient("contradiction"), ConflictType::Factual);
        assert_eq!(ConflictType::parse_lenient(""), ConflictType::Factual);
    }

    #[test]
    fn test_parse_judgement_plain() {
        let reply = r#"{"has_conflict": true, "conflict_type": "numerical",
            "confidence": 0.8, "explanation": "Different limits", "recommendation": "Check docs"}"#;
        let judgement = parse_conflict_judgement(reply).unwrap();
        assert!(judgement.has_conflict);
        assert_eq!(judgement.confidence, Some(0.8));
    }

    #[test]
    fn test_parse_judgement_fenced() {
        let reply = "```json\n{\"has_conflict\": false}\n```";
        let judgement = parse_conflict_judgement(reply).unwrap();
        assert!(!judgement.has_conflict);
    }

    #[test]
    fn test_parse_judgement_garbage() {
        assert!(parse_conflict_judgement("no json here").is_none());
    }

    fn sample_conflict() -> DetectedConflict {
        DetectedConflict {
            side_a: ConflictSide {
                chunk_id: 1,
                document_id: 10,
                source_name: "API Docs".into(),
                author: Some("docs-team".into()),
                content_preview: "The API supports 100 requests per minute.".into(),
            },
            side_b: ConflictSide {
                chunk_id: 2,
                document_id: 20,
                source_name: "Slack".into(),
                author: None,
                content_preview: "Rate limit was raised to 500 rpm last week.".into(),
            },
            conflict_type: ConflictType::Numerical,
            confidence: 0.85,
            explanation: "Documents disagree on the rate limit.".into(),
            recommendation: "Prefer the newer announcement.".into(),
        }
    }

    #[test]
    fn test_prompt_warning_mentions_both_sides() {
        let text = DetectedConflict::format_for_prompt(&[sample_conflict()]);
        assert!(text.contains("NUMERICAL conflict"));
        assert!(text.contains("API Docs"));
        assert!(text.contains("Slack"));
        assert!(text.contains("85%"));
    }

    #[test]
    fn test_empty_conflicts_format_empty() {
        assert!(DetectedConflict::format_for_prompt(&[]).is_empty());
        assert!(DetectedConflict::format_report(&[]).is_empty());
    }

    #[test]
    fn test_report_numbering() {
        let report = DetectedConflict::format_report(&[sample_conflict(), sample_conflict()]);
        assert!(report.contains("Conflict #1"));
        assert!(report.contains("Conflict #2"));
    }
}
