//! Parsing of reviewer replies into validated [`PeerRanking`]s.
//!
//! The review prompt demands a strict JSON shape:
//!
//! ```json
//! {
//!   "rankings": [
//!     {"response_id": "A", "rank": 1, "reasoning": "..."}
//!   ]
//! }
//! ```
//!
//! Models wrap JSON in prose or markdown fences, so the payload is located
//! by code-fence stripping or outermost-brace extraction before the strict
//! serde parse. Anything that does not conform — unknown letters, duplicate
//! or missing ranks, malformed JSON — rejects the whole reply and the review
//! is dropped.

use crate::core::model::ModelId;
use crate::council::anonymize::AnonymizedPanel;
use crate::council::ranking::{PeerRanking, RankingEntry};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ReviewReply {
    rankings: Vec<ReplyEntry>,
}

#[derive(Debug, Deserialize)]
struct ReplyEntry {
    response_id: String,
    rank: u32,
    #[serde(default)]
    reasoning: String,
}

/// Parse a reviewer's raw reply against its anonymized panel.
///
/// Returns `None` for any non-conforming reply; the caller drops the review
/// and continues the session.
pub fn parse_review_reply(
    reviewer: &ModelId,
    reply: &str,
    panel: &AnonymizedPanel,
) -> Option<PeerRanking> {
    let json = extract_json_object(reply)?;
    let parsed: ReviewReply = serde_json::from_str(json).ok()?;

    let mut entries = Vec::with_capacity(parsed.rankings.len());
    for item in parsed.rankings {
        let mut chars = item.response_id.trim().chars();
        let letter = chars.next()?;
        // "A" only, not "AB" or "Response A"
        if chars.next().is_some() {
            return None;
        }
        let model = panel.resolve(letter)?.clone();
        entries.push(RankingEntry {
            model,
            rank: item.rank,
            reasoning: item.reasoning,
        });
    }

    PeerRanking::new(reviewer.clone(), entries).ok()
}

/// Locate the JSON object inside a possibly prose-wrapped reply.
fn extract_json_object(reply: &str) -> Option<&str> {
    let trimmed = reply.trim();

    // Markdown code fence, with or without a `json` language tag
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
    Some(&body[start..=end])
}
