use std::collections::BTreeSet;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "him", "his", "how", "its", "may", "new", "now", "old", "see",
    "two", "who", "did", "does", "get", "got", "let", "say", "she", "too", "use", "used", "this",
    "that", "with", "from", "they", "them", "then", "than", "there", "their", "these", "those",
    "what", "when", "where", "which", "while", "will", "would", "could", "should", "about",
    "into", "over", "also", "been", "being", "have", "were", "your", "some", "such", "only",
    "other", "very", "just", "more", "most", "much", "many", "each", "both", "here", "why",
    "paper", "please", "tell", "show", "explain", "describe",
];

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Lower-cased unicode words longer than two characters, stop-words removed.
/// Each keyword appears once.
pub fn keywords(text: &str) -> BTreeSet<String> {
    text.unicode_words()
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() > 2 && !is_stop_word(w))
        .collect()
}

/// Fraction of `query_keywords` present in `text`, in `[0, 1]`. An empty
/// keyword set yields 0.
pub fn keyword_overlap(query_keywords: &BTreeSet<String>, text: &str) -> f32 {
    if query_keywords.is_empty() {
        return 0.0;
    }
    let text_words = keywords(text);
    let hits = query_keywords
        .iter()
        .filter(|k| text_words.contains(*k))
        .count();
    hits as f32 / query_keywords.len() as f32
}

/// Lower-case and collapse every whitespace run to a single space.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sentence-length fragments of `text` longer than ten characters, used for
/// verbatim phrase matching.
pub fn phrases(text: &str) -> Vec<String> {
    text.split(['.', '!', '?', ';', '\n'])
        .map(normalize)
        .filter(|p| p.chars().count() > 10)
        .collect()
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Like [`truncate_chars`] but appends an ellipsis when something was cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let cut = truncate_chars(text, max_chars);
    if cut.len() < text.len() {
        format!("{}...", cut.trim_end())
    } else {
        cut.to_string()
    }
}

/// Compile a static pattern table. Patterns are literals; any that fail to
/// compile are logged and skipped.
pub(crate) fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(pattern = %p, error = %e, "Skipping invalid pattern");
                None
            }
        })
        .collect()
}
