//! Sentence segmentation for speech playback
//!
//! Splits a reply into sentence-like pieces so each can be queued as its own
//! utterance. Boundaries are `.`, `!`, `?` and newline. A run of boundary
//! characters stays attached to the text before it, every piece is trimmed,
//! and pieces that end up empty are dropped.

use regex::Regex;
use std::sync::LazyLock;

static SENTENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^.!?\n]+[.!?\n]*").expect("sentence pattern is valid")
});

/// Split `text` into trimmed, non-empty segments in original order
pub fn split_sentences(text: &str) -> Vec<String> {
    SENTENCE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
