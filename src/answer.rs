//! Answer normalization and comparison.

use unicode_normalization::UnicodeNormalization;

/// Trim surrounding whitespace and case-fold.
pub fn normalize_answer(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Whether typed input matches an expected answer after normalization
pub fn answers_match(input: &str, expected: &str) -> bool {
    normalize_answer(input) == normalize_answer(expected)
}

/// Remove tone diacritics from pinyin: "nǚ" -> "nu", "lǜ" -> "lu".
///
/// `v` is the keyboard stand-in for `ü` and is folded to `u` as well.
pub fn strip_tone_marks(pinyin: &str) -> String {
    pinyin
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .map(|c| match c {
            'v' => 'u',
            'V' => 'U',
            other => other,
        })
        .collect()
}
