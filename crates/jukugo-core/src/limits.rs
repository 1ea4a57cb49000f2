//! Input validation limits for query parameters

use crate::script::is_kanji;

/// Longest word the graph can hold (the strongest length gate)
pub const MAX_WORD_LEN: usize = 4;

/// Positions are indices into at most `MAX_WORD_LEN` characters
pub const MAX_POSITION: u32 = MAX_WORD_LEN as u32 - 1;

/// Maximum distractors per challenge (10)
pub const MAX_DISTRACTORS: usize = 10;

/// Validation error type
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyCharacter,
    NotSingleCharacter { count: usize },
    EmptyWord,
    TooManyDistractors { count: usize, max: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCharacter => write!(f, "Character cannot be empty"),
            Self::NotSingleCharacter { count } => {
                write!(f, "Expected a single character, got {}", count)
            }
            Self::EmptyWord => write!(f, "Word cannot be empty"),
            Self::TooManyDistractors { count, max } => {
                write!(f, "Too many distractors: {} (max {})", count, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a glyph parameter and return it as a `char`.
///
/// Any single character is accepted; one that is not kanji simply matches
/// nothing in the graph.
pub fn validate_character(input: &str) -> Result<char, ValidationError> {
    let mut chars = input.chars();
    let first = chars.next().ok_or(ValidationError::EmptyCharacter)?;
    if chars.next().is_some() {
        return Err(ValidationError::NotSingleCharacter {
            count: input.chars().count(),
        });
    }
    Ok(first)
}

/// Validate a word parameter
pub fn validate_word(word: &str) -> Result<(), ValidationError> {
    if word.is_empty() {
        return Err(ValidationError::EmptyWord);
    }
    Ok(())
}

/// Whether a (character, word, position) triple could name a FORMS edge at
/// all. Triples outside these bounds are answered negatively without a lookup.
pub fn could_form(glyph: char, word: &str, position: u32) -> bool {
    is_kanji(glyph) && position <= MAX_POSITION && word.chars().count() <= MAX_WORD_LEN
}

/// Validate a distractor count
pub fn validate_distractors(count: usize) -> Result<(), ValidationError> {
    if count > MAX_DISTRACTORS {
        return Err(ValidationError::TooManyDistractors {
            count,
            max: MAX_DISTRACTORS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_character() {
        assert_eq!(validate_character("木"), Ok('木'));
        assert_eq!(validate_character("き"), Ok('き'));
        assert_eq!(validate_character(""), Err(ValidationError::EmptyCharacter));
        assert_eq!(
            validate_character("木林"),
            Err(ValidationError::NotSingleCharacter { count: 2 })
        );
    }

    #[test]
    fn test_word_and_position_bounds() {
        assert!(validate_word("木林").is_ok());
        assert!(validate_word("木林山川海").is_ok());
        assert!(validate_word("").is_err());

        assert!(could_form('木', "木林", 3));
        assert!(!could_form('木', "木林", 4));
        assert!(!could_form('き', "き林", 0));
        assert!(!could_form('木', "木林山川海", 0));

        assert!(validate_distractors(10).is_ok());
        assert!(validate_distractors(11).is_err());
    }
}
