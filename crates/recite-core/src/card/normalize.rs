//! Intake normalization
//!
//! Generated card text arrives with inconsistent whitespace and punctuation.
//! Prompts get whitespace collapsed; lemmas are additionally lowercased and
//! stripped of punctuation so de-duplication compares dictionary forms, not
//! surface spellings.

/// Collapse runs of whitespace and trim
pub fn normalize_prompt(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase, replace punctuation with spaces (letters, digits, and `-`
/// survive), collapse whitespace. Returns `None` when nothing is left.
pub fn normalize_lemma(input: &str) -> Option<String> {
    let cleaned: String = input
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' {
                c
            } else {
                ' '
            }
        })
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}
