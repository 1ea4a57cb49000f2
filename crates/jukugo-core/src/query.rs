//! Read-side result types

use serde::{Deserialize, Serialize};

use crate::node::{CharacterNode, WordNode};

/// Another character forming the same compound
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoCharacter {
    pub character: char,
    pub position: u32,
}

/// One compound containing a queried character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundEntry {
    pub word: String,
    pub reading: String,
    pub meaning: String,
    /// Position of the queried character in this word
    pub position: u32,
    /// Other characters of the word, ordered by position
    pub co_characters: Vec<CoCharacter>,
}

/// Result of validating a (character, word, position) triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<WordNode>,
}

impl CompoundValidation {
    pub fn valid(word: WordNode) -> Self {
        Self {
            valid: true,
            word: Some(word),
        }
    }

    pub fn invalid() -> Self {
        Self {
            valid: false,
            word: None,
        }
    }
}

impl From<Option<WordNode>> for CompoundValidation {
    fn from(word: Option<WordNode>) -> Self {
        word.map(Self::valid).unwrap_or_else(Self::invalid)
    }
}

/// A character to quiz on plus same-level distractors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterChallenge {
    pub character: CharacterNode,
    pub distractors: Vec<CharacterNode>,
}

/// Node and edge counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub characters: usize,
    pub words: usize,
    pub forms: usize,
}

impl GraphStats {
    pub fn is_empty(&self) -> bool {
        self.characters == 0 && self.words == 0 && self.forms == 0
    }
}
