//! Prompt templates for the council flow and the retrieval engine.

use crate::council::anonymize::AnonymizedPanel;
use crate::council::answer::ModelAnswer;
use crate::council::ranking::PeerRanking;
use crate::rag::conflict::DetectedConflict;
use crate::rag::scored::ScoredChunk;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for the first-opinions stage
    pub fn first_opinion_system() -> &'static str {
        r#"You are a knowledgeable expert asked for an independent opinion.
Provide a thoughtful, well-reasoned response to the question.
Be concise but comprehensive. Support your points with reasoning and examples where appropriate.
Focus on accuracy and clarity."#
    }

    /// System prompt for the review stage
    pub fn review_system() -> &'static str {
        r#"You are a critical reviewer evaluating responses from other experts.
Assess quality, accuracy, completeness, and usefulness objectively.
Always reply with valid JSON exactly matching the requested schema."#
    }

    /// User prompt asking a reviewer to rank an anonymized panel.
    ///
    /// The reply contract is strict: a JSON object with a `rankings` array of
    /// `{response_id, rank, reasoning}`. Anything else is dropped by the
    /// parser.
    pub fn review_prompt(query: &str, panel: &AnonymizedPanel) -> String {
        let mut prompt = format!(
            r#"You are reviewing responses from other AI models to the following user query:

USER QUERY: {query}

Below are the responses from other models (anonymized as A, B, C, etc.):
"#
        );

        for (letter, content) in panel.entries() {
            prompt.push_str(&format!("\n===== Response {letter} =====\n{content}\n"));
        }

        prompt.push_str(
            r#"
Your task is to:
1. Evaluate each response for accuracy, completeness, clarity, and usefulness
2. Rank them from best to worst (rank 1 is best; use each rank exactly once)
3. Provide brief reasoning for your rankings

Respond with ONLY a JSON object in this exact format:
{
  "rankings": [
    {"response_id": "A", "rank": 1, "reasoning": "Why this is ranked first"},
    {"response_id": "B", "rank": 2, "reasoning": "Why this is ranked second"}
  ]
}

Be objective and critical. Focus on factual accuracy and helpfulness.
"#,
        );

        prompt
    }

    /// System prompt for the chairman's synthesis
    pub fn synthesis_system() -> &'static str {
        r#"You are the chairman of a council of AI models, synthesizing their opinions into one answer.
Identify areas of consensus, weigh disagreements using the peer rankings,
and combine the strongest elements into a comprehensive final response.
Be balanced and objective. Give weight to well-reasoned arguments regardless of source."#
    }

    /// User prompt for the chairman, carrying all opinions and rankings.
    pub fn synthesis_prompt(
        query: &str,
        answers: &[&ModelAnswer],
        rankings: &[PeerRanking],
    ) -> String {
        let mut prompt = format!("Original question: {query}\n\nCouncil responses:\n");

        for answer in answers {
            prompt.push_str(&format!("\n--- {} ---\n{}\n", answer.model, answer.content));
        }

        if !rankings.is_empty() {
            prompt.push_str("\nPeer rankings (each reviewer ranked the others' anonymous answers):\n");
            for ranking in rankings {
                prompt.push_str(&format!("\n--- Rankings by {} ---\n", ranking.reviewer));
                for entry in &ranking.entries {
                    prompt.push_str(&format!(
                        "{}. {} — {}\n",
                        entry.rank, entry.model, entry.reasoning
                    ));
                }
            }
        }

        prompt.push_str(
            r#"
Based on all responses and rankings above, produce the final answer for the user.
Incorporate the strongest elements from all responses, note significant
disagreements where they matter, and answer the original question directly."#,
        );

        prompt
    }

    /// System prompt for the conflict classifier
    pub fn conflict_system() -> &'static str {
        "You analyze text for contradictions. Always respond in valid JSON."
    }

    /// User prompt asking the classifier whether two passages conflict.
    pub fn conflict_prompt(
        source_a: &str,
        content_a: &str,
        source_b: &str,
        content_b: &str,
    ) -> String {
        format!(
            r#"You are an expert at analyzing text for contradictions and conflicts.

Given two text passages from different sources, analyze if they contain any conflicting information.

Passage A (from {source_a}):
{content_a}

Passage B (from {source_b}):
{content_b}

Analyze these passages and determine if there is a conflict. Consider these conflict types:
- factual: Direct contradiction of facts
- temporal: Information that may be outdated vs newer
- opinion: Different interpretations or opinions on the same topic
- numerical: Conflicting numbers, statistics, or quantitative data
- procedural: Different steps or processes for the same task

Respond in JSON format:
{{
    "has_conflict": true/false,
    "conflict_type": "factual|temporal|opinion|numerical|procedural|none",
    "confidence": 0.0-1.0,
    "explanation": "Brief explanation of the conflict",
    "recommendation": "Suggestion for resolving or handling the conflict"
}}

If there is no conflict, set has_conflict to false and leave other fields as appropriate defaults.
Be conservative - only flag genuine contradictions, not complementary information."#
        )
    }

    /// Assemble the augmented prompt: context block, optional conflict
    /// warning, the original query, and a citation instruction.
    pub fn augmented_prompt(
        original_query: &str,
        context_text: &str,
        conflicts: &[DetectedConflict],
    ) -> String {
        let mut parts: Vec<String> = Vec::new();

        if !context_text.is_empty() {
            parts.push(
                "The following relevant information has been retrieved from the knowledge base. \
                 Use this context to inform your response, but also apply your own knowledge and reasoning.\n"
                    .to_string(),
            );
            parts.push("### Retrieved Context ###".to_string());
            parts.push(context_text.to_string());
            parts.push("### End of Context ###\n".to_string());
        }

        let warning = DetectedConflict::format_for_prompt(conflicts);
        if !warning.is_empty() {
            parts.push(warning);
        }

        parts.push("### User Query ###".to_string());
        parts.push(original_query.to_string());

        if !context_text.is_empty() {
            parts.push(
                "\nWhen using information from the retrieved context, \
                 please cite the source (e.g., 'According to [Source Name]...')."
                    .to_string(),
            );
        }

        parts.join("\n")
    }

    /// Render scored chunks into the citation-headed context block, stopping
    /// before the running token estimate exceeds `max_tokens`.
    pub fn context_text(chunks: &[ScoredChunk], max_tokens: usize) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut total_tokens = 0usize;

        for (i, chunk) in chunks.iter().enumerate() {
            let part = format!(
                "[Source {}: {} (confidence: {:.2})]\n{}\n",
                i + 1,
                chunk.citation(),
                chunk.final_score,
                chunk.chunk.content
            );

            // Rough token estimate (4 chars per token)
            let part_tokens = part.len() / 4;
            if total_tokens + part_tokens > max_tokens {
                break;
            }
            total_tokens += part_tokens;
            parts.push(part);
        }

        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::ModelId;
    use crate::rag::chunk::TextChunk;
    use crate::rag::source::{ChunkProvenance, SourceType};

    fn scored(chunk_id: u64, content: &str, score: f64) -> ScoredChunk {
        ScoredChunk {
            chunk: TextChunk::new(content, 0, content.len() / 4),
            provenance: ChunkProvenance::new(chunk_id, 1, "wiki", SourceType::Notion, "Handbook"),
            similarity_score: score,
            source_trust_score: 0.7,
            recency_score: 0.5,
            author_authority_score: 0.5,
            final_score: score,
        }
    }

    #[test]
    fn test_review_prompt_contains_panel() {
        let answers = vec![
            ModelAnswer::success("alpha", "first answer"),
            ModelAnswer::success("beta", "second answer"),
        ];
        let panel = AnonymizedPanel::for_reviewer(&ModelId::new("alpha"), &answers);
        let prompt = PromptTemplate::review_prompt("the question", &panel);
        assert!(prompt.contains("the question"));
        assert!(prompt.contains("===== Response A ====="));
        assert!(prompt.contains("second answer"));
        assert!(!prompt.contains("first answer"));
        assert!(prompt.contains("response_id"));
    }

    #[test]
    fn test_synthesis_prompt_includes_rankings() {
        let a1 = ModelAnswer::success("alpha", "use postgres");
        let a2 = ModelAnswer::success("beta", "use sqlite");
        let answers = vec![&a1, &a2];
        let ranking = PeerRanking::new(
            "alpha",
            vec![crate::council::ranking::RankingEntry {
                model: "beta".into(),
                rank: 1,
                reasoning: "clear".into(),
            }],
        )
        .unwrap();
        let prompt = PromptTemplate::synthesis_prompt("which db?", &answers, &[ranking]);
        assert!(prompt.contains("use postgres"));
        assert!(prompt.contains("Rankings by alpha"));
    }

    #[test]
    fn test_augmented_prompt_order() {
        let prompt = PromptTemplate::augmented_prompt("what is x?", "some context", &[]);
        let context_pos = prompt.find("Retrieved Context").unwrap();
        let query_pos = prompt.find("### User Query ###").unwrap();
        let cite_pos = prompt.find("cite the source").unwrap();
        assert!(context_pos < query_pos);
        assert!(query_pos < cite_pos);
        assert!(prompt.contains("what is x?"));
    }

    #[test]
    fn test_augmented_prompt_without_context_is_bare() {
        let prompt = PromptTemplate::augmented_prompt("what is x?", "", &[]);
        assert!(!prompt.contains("Retrieved Context"));
        assert!(!prompt.contains("cite the source"));
        assert!(prompt.contains("what is x?"));
    }

    #[test]
    fn test_context_text_respects_token_budget() {
        let chunks: Vec<ScoredChunk> = (0..10)
            .map(|i| scored(i, &"long chunk content ".repeat(50), 0.9))
            .collect();
        let text = PromptTemplate::context_text(&chunks, 300);
        // ~250 tokens per part: only one fits the 300-token budget
        assert!(text.contains("[Source 1:"));
        assert!(!text.contains("[Source 3:"));
    }

    #[test]
    fn test_context_text_empty_when_nothing_fits() {
        let chunks = vec![scored(1, &"big ".repeat(2000), 0.9)];
        assert!(PromptTemplate::context_text(&chunks, 10).is_empty());
    }
}
