//! Entity key normalization.
//!
//! Two raw ids denote the same entity when their keys are equal. The key is
//! purely lexical: case, punctuation, width variants and bracketed
//! qualifiers collapse, but spellings in different scripts do not
//! ("爱因斯坦" and "Einstein" stay distinct).

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Bracketed annotations, matched non-greedily: full-width and ASCII
/// parentheses, lenticular and square brackets, angle brackets, braces.
static ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"（.*?）|\(.*?\)|【.*?】|\[.*?\]|<.*?>|\{.*?\}").expect("annotation pattern is valid")
});

/// Derive the comparison key for an entity id.
///
/// Returns an empty string when nothing identifiable remains.
pub fn normalize_entity_key(value: &str) -> String {
    let composed: String = value.nfkc().collect();
    let stripped = ANNOTATION.replace_all(&composed, "");
    stripped
        .to_lowercase()
        .chars()
        .filter(|&c| is_key_char(c))
        .collect::<String>()
        .trim()
        .to_string()
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('\u{4e00}'..='\u{9fa5}').contains(&c)
}
