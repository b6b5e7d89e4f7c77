//! Page-text normalization.
//!
//! Extracted PDF text is noisy: glyph positioning splits words, whitespace
//! runs vary per producer. Normalization makes the downstream regexes simple
//! and deterministic.

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

// Repairs "U nit" / "UN IT" / "u n i t" artifacts left by text extraction.
static SPLIT_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"u\s*n\s*i\s*t").expect("valid unit-repair pattern"));

/// Normalize extracted page text for marker detection.
///
/// Lowercases, collapses whitespace runs to single spaces, trims, and rejoins
/// the word "unit" when extraction split it across glyph runs.
pub fn normalize_page_text(text: &str) -> String {
    let collapsed = WHITESPACE.replace_all(text, " ");
    let lowered = collapsed.to_lowercase();
    SPLIT_UNIT.replace_all(&lowered, "unit").trim().to_string()
}

/// Normalize a filename stem for classification.
///
/// Lowercases and maps `_`/`-` separators to spaces so the category patterns
/// match regardless of naming convention.
pub fn normalize_file_name(name: &str) -> String {
    let spaced = name.to_lowercase().replace(['_', '-'], " ");
    WHITESPACE.replace_all(&spaced, " ").trim().to_string()
}
