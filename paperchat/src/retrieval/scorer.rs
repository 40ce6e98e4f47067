use std::collections::BTreeSet;

use super::text::{keyword_overlap, keywords, normalize, phrases};

/// Weight given to keyword overlap on top of the category weight.
const OVERLAP_FACTOR: f32 = 0.3;
const SHARED_WORD_FACTOR: f32 = 3.0;
const PHRASE_BONUS: f32 = 2.0;
const MAX_BOOST: f32 = 10.0;

/// Scores chunk text against one query and an optional selection.
///
/// Keyword sets are computed once up front; scoring a chunk is then a pure
/// function of its text and category weight.
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    query_keywords: BTreeSet<String>,
    selection_words: BTreeSet<String>,
    selection_phrases: Vec<String>,
}

impl RelevanceScorer {
    pub fn new(query: &str, selected_text: Option<&str>) -> Self {
        let selected = selected_text.unwrap_or_default();
        Self {
            query_keywords: keywords(query),
            selection_words: keywords(selected),
            selection_phrases: phrases(selected),
        }
    }

    pub fn query_keywords(&self) -> &BTreeSet<String> {
        &self.query_keywords
    }

    /// `min(1, weight + 0.3 * overlap)` plus the selection boost scaled into
    /// the same range. Always within `[0, 1]`.
    pub fn score(&self, text: &str, weight: f32) -> f32 {
        let overlap = keyword_overlap(&self.query_keywords, text);
        let base = (weight + OVERLAP_FACTOR * overlap).min(1.0);

        if self.selection_words.is_empty() && self.selection_phrases.is_empty() {
            return base.clamp(0.0, 1.0);
        }

        (base + self.selection_boost(text) / MAX_BOOST).clamp(0.0, 1.0)
    }

    /// Similarity of `text` to the selection, in `[0, 10]`.
    pub fn selection_boost(&self, text: &str) -> f32 {
        let mut boost = 0.0;

        if !self.selection_words.is_empty() {
            let text_words = keywords(text);
            let shared = self
                .selection_words
                .iter()
                .filter(|w| text_words.contains(*w))
                .count();
            boost += SHARED_WORD_FACTOR * shared as f32 / self.selection_words.len() as f32;
        }

        if !self.selection_phrases.is_empty() {
            let normalized = normalize(text);
            let matches = self
                .selection_phrases
                .iter()
                .filter(|p| normalized.contains(p.as_str()))
                .count();
            boost += PHRASE_BONUS * matches as f32;
        }

        boost.clamp(0.0, MAX_BOOST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_scores_weight_only() {
        let scorer = RelevanceScorer::new("", None);
        assert!(scorer.query_keywords().is_empty());
        assert_eq!(scorer.score("Anything goes here.", 0.4), 0.4);
        assert_eq!(scorer.score("", 0.0), 0.0);
    }

    #[test]
    fn test_overlap_raises_score() {
        let scorer = RelevanceScorer::new("dropout regularization", None);
        let hit = scorer.score("Dropout is a regularization technique.", 0.5);
        let miss = scorer.score("We use a transformer encoder.", 0.5);
        assert!((hit - 0.8).abs() < 1e-6);
        assert_eq!(miss, 0.5);
    }

    #[test]
    fn test_score_is_capped_at_one() {
        let scorer = RelevanceScorer::new("attention heads", None);
        assert_eq!(scorer.score("attention heads", 0.95), 1.0);
    }

    #[test]
    fn test_selection_similarity_boosts() {
        let selection = "Multi-head attention lets the model attend to several subspaces jointly.";
        let scorer = RelevanceScorer::new("what does this mean", Some(selection));

        let related = "Multi-head attention lets the model attend to several subspaces jointly. \
                       We use eight heads.";
        let unrelated = "The dataset contains images of cats.";

        let boosted = scorer.score(related, 0.3);
        let plain = scorer.score(unrelated, 0.3);
        assert!(boosted > plain);
        assert_eq!(plain, 0.3);
        // all selection words shared (+3) and one verbatim phrase (+2)
        assert!((boosted - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_boost_never_exceeds_ten() {
        let sentence = "Attention weights are computed with a softmax over scaled dot products";
        let selection = [sentence; 8].join(". ");
        let scorer = RelevanceScorer::new("", Some(&selection));
        assert!(scorer.selection_boost(&selection) <= 10.0);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let scorer = RelevanceScorer::new("batch normalization layers", Some("batch statistics"));
        let text = "Batch normalization uses batch statistics during training.";
        assert_eq!(scorer.score(text, 0.6), scorer.score(text, 0.6));
    }
}
