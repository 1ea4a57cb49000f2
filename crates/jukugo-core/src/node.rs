//! Graph node and edge types

use serde::{Deserialize, Serialize};

use crate::level::Level;

/// A kanji in the graph, keyed by its glyph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterNode {
    /// The glyph itself (unique key)
    pub glyph: char,

    /// Level of the most recent import that touched this character
    pub level: Level,
}

impl CharacterNode {
    pub fn new(glyph: char, level: Level) -> Self {
        Self { glyph, level }
    }
}

/// A compound word in the graph, keyed by its text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordNode {
    /// Written form (unique key)
    pub text: String,

    /// First reading from the dictionary, or empty
    pub reading: String,

    /// First gloss of the first sense, or empty
    pub meaning: String,

    /// Character count of `text`
    pub length: usize,
}

impl WordNode {
    pub fn new(
        text: impl Into<String>,
        reading: impl Into<String>,
        meaning: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let length = text.chars().count();
        Self {
            text,
            reading: reading.into(),
            meaning: meaning.into(),
            length,
        }
    }
}

/// A FORMS edge: `character` occurs at `position` in `word`.
///
/// At most one edge exists per (character, word) pair; re-import overwrites
/// the position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormsEdge {
    pub character: char,
    pub word: String,
    /// Zero-based index within the word's qualifying-character sequence
    pub position: u32,
}

impl FormsEdge {
    pub fn new(character: char, word: impl Into<String>, position: u32) -> Self {
        Self {
            character,
            word: word.into(),
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_length_counts_characters() {
        let word = WordNode::new("食べ物", "たべもの", "food");
        assert_eq!(word.length, 3);
        assert_eq!(word.reading, "たべもの");
    }

    #[test]
    fn test_character_node() {
        let node = CharacterNode::new('木', Level::N5);
        assert_eq!(node.glyph, '木');
        assert_eq!(node.level, Level::N5);
    }
}
