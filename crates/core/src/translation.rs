//! Checking free-text sentence translations.

use crate::content::TranslationItem;

const IGNORED_PUNCTUATION: [char; 3] = ['?', '.', '!'];

/// Lowercase, trim, then drop `?`, `.` and `!`.
///
/// Inner whitespace and other punctuation (commas, apostrophes) are kept.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .trim()
        .chars()
        .filter(|c| !IGNORED_PUNCTUATION.contains(c))
        .collect()
}

/// Whether `given` matches `expected` once both are normalised.
///
/// # Examples
///
/// ```
/// use lingo_core::translation::is_correct;
///
/// assert!(is_correct("  when is the meeting ", "When is the meeting?"));
/// assert!(!is_correct("When is meeting?", "When is the meeting?"));
/// ```
#[must_use]
pub fn is_correct(given: &str, expected: &str) -> bool {
    normalize(given) == normalize(expected)
}

/// Result of checking one answer against a drill item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationCheck<'a> {
    pub item: &'a TranslationItem,
    pub given: String,
    pub correct: bool,
}

/// Check answers against `items` in order. Extra answers are ignored and
/// missing answers leave the remaining items unchecked.
#[must_use]
pub fn check_all<'a, S: AsRef<str>>(
    items: &'a [TranslationItem],
    answers: &[S],
) -> Vec<TranslationCheck<'a>> {
    items
        .iter()
        .zip(answers)
        .map(|(item, given)| TranslationCheck {
            item,
            given: given.as_ref().to_owned(),
            correct: is_correct(given.as_ref(), &item.english),
        })
        .collect()
}
