//! Acceptance rules for confession text.
//!
//! Lengths and ratios are counted in Unicode scalar values of the trimmed
//! text.

use std::collections::HashMap;

use thiserror::Error;

/// Shortest accepted confession, in characters.
pub const MIN_CONFESSION_CHARS: usize = 120;

const MAX_REPEAT_RATIO: f64 = 0.6;
const MAX_EMOJI_RATIO: f64 = 0.7;
const MAX_WHITESPACE_RATIO: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("Confession text cannot be empty")]
    Empty,

    #[error("Confession must be at least {0} characters long")]
    TooShort(usize),

    #[error("Confession contains too much repetition")]
    Repetitive,

    #[error("Confession cannot be mostly emojis")]
    MostlyEmoji,

    #[error("Confession cannot be mostly whitespace")]
    MostlyWhitespace,
}

fn is_emoji(c: char) -> bool {
    ('\u{1F300}'..='\u{1F9FF}').contains(&c)
}

/// Check a confession and return its trimmed form.
pub fn validate_confession(text: &str) -> Result<&str, ContentError> {
    let trimmed = text.trim();
    let len = trimmed.chars().count();

    if len == 0 {
        return Err(ContentError::Empty);
    }
    if len < MIN_CONFESSION_CHARS {
        return Err(ContentError::TooShort(MIN_CONFESSION_CHARS));
    }

    let mut counts: HashMap<char, usize> = HashMap::new();
    for c in trimmed.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }
    let max_count = counts.values().copied().max().unwrap_or(0);
    if max_count as f64 / len as f64 > MAX_REPEAT_RATIO {
        return Err(ContentError::Repetitive);
    }

    let whitespace = trimmed.chars().filter(|c| c.is_whitespace()).count();
    let non_whitespace = len - whitespace;
    let emoji = trimmed.chars().filter(|c| is_emoji(*c)).count();
    if non_whitespace > 0 && emoji as f64 / non_whitespace as f64 > MAX_EMOJI_RATIO {
        return Err(ContentError::MostlyEmoji);
    }

    if whitespace as f64 / len as f64 > MAX_WHITESPACE_RATIO {
        return Err(ContentError::MostlyWhitespace);
    }

    Ok(trimmed)
}
