//! Anonymization of answers for the review stage.
//!
//! Each reviewer sees the other valid answers labelled with deterministic
//! single letters (`A`, `B`, `C`, …) assigned in the answers' original
//! order, with the reviewer's own answer excluded. The panel keeps the
//! letter -> model map so rankings can be translated back.

use crate::core::model::ModelId;
use crate::council::answer::ModelAnswer;

/// An anonymized view of the other members' answers, from one reviewer's
/// perspective.
#[derive(Debug, Clone)]
pub struct AnonymizedPanel {
    entries: Vec<(char, String)>,
    map: Vec<(char, ModelId)>,
}

impl AnonymizedPanel {
    /// Build the panel a given reviewer should see.
    ///
    /// `answers` must already be filtered to valid (non-error) answers; their
    /// order determines letter assignment, so every reviewer labels the same
    /// answer with the same letter except for the gap left by its own.
    pub fn for_reviewer(reviewer: &ModelId, answers: &[ModelAnswer]) -> Self {
        let mut entries = Vec::new();
        let mut map = Vec::new();

        for answer in answers.iter().filter(|a| &a.model != reviewer) {
            let letter = (b'A' + map.len() as u8) as char;
            entries.push((letter, answer.content.clone()));
            map.push((letter, answer.model.clone()));
        }

        Self { entries, map }
    }

    /// `(letter, content)` pairs in presentation order.
    pub fn entries(&self) -> &[(char, String)] {
        &self.entries
    }

    /// Translate an anonymous letter back to the model it hides.
    pub fn resolve(&self, letter: char) -> Option<&ModelId> {
        self.map
            .iter()
            .find(|(l, _)| *l == letter)
            .map(|(_, model)| model)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(models: &[&str]) -> Vec<ModelAnswer> {
        models
            .iter()
            .map(|m| ModelAnswer::success(*m, format!("answer from {m}")))
            .collect()
    }

    #[test]
    fn test_reviewer_excluded() {
        let panel =
            AnonymizedPanel::for_reviewer(&ModelId::new("b"), &answers(&["a", "b", "c"]));
        assert_eq!(panel.len(), 2);
        assert_eq!(panel.resolve('A'), Some(&ModelId::new("a")));
        assert_eq!(panel.resolve('B'), Some(&ModelId::new("c")));
    }

    #[test]
    fn test_letters_follow_original_order() {
        let panel =
            AnonymizedPanel::for_reviewer(&ModelId::new("d"), &answers(&["a", "b", "c", "d"]));
        let letters: Vec<char> = panel.entries().iter().map(|(l, _)| *l).collect();
        assert_eq!(letters, vec!['A', 'B', 'C']);
    }

    #[test]
    fn test_round_trip_for_every_letter() {
        let source = answers(&["a", "b", "c", "d", "e"]);
        let reviewer = ModelId::new("c");
        let panel = AnonymizedPanel::for_reviewer(&reviewer, &source);

        for (letter, _) in panel.entries() {
            let model = panel.resolve(*letter).expect("letter must resolve");
            assert_ne!(model, &reviewer);
            assert!(source.iter().any(|a| &a.model == model));
        }
    }

    #[test]
    fn test_unknown_letter_unresolved() {
        let panel = AnonymizedPanel::for_reviewer(&ModelId::new("a"), &answers(&["a", "b"]));
        assert_eq!(panel.resolve('Z'), None);
    }

    #[test]
    fn test_single_answer_panel_is_empty() {
        let panel = AnonymizedPanel::for_reviewer(&ModelId::new("a"), &answers(&["a"]));
        assert!(panel.is_empty());
    }
}
