//! Comparison form of answers: trimmed, lower-cased, accents stripped.

use unicode_normalization::UnicodeNormalization;

/// Combining Diacritical Marks block.
fn is_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// Folds `s` to the form used for every answer comparison.
///
/// Lower-casing runs before decomposition so that marks produced by case
/// mapping (`İ` lowers to `i` + U+0307) are stripped too, and trimming runs
/// last so a stray leading mark cannot hide whitespace. Both keep the
/// function idempotent.
pub fn normalize(s: &str) -> String {
    let folded: String = s
        .to_lowercase()
        .nfd()
        .filter(|c| !is_diacritic(*c))
        .collect();
    folded.trim().to_string()
}
