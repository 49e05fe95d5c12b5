//! Accent- and case-insensitive text folding.
//!
//! Region matching compares user-typed place names ("Caçapava") against
//! addresses rendered by the map surface ("CACAPAVA"), so both sides are
//! lowercased, decomposed (NFD), and stripped of combining marks.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercase `text` and drop diacritics: `"São José"` → `"sao jose"`.
#[must_use]
pub fn fold_text(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Split folded text into words strictly longer than `min_len` characters.
#[must_use]
pub fn significant_words(text: &str, min_len: usize) -> Vec<String> {
    fold_text(text)
        .split_whitespace()
        .filter(|w| w.chars().count() > min_len)
        .map(str::to_owned)
        .collect()
}
