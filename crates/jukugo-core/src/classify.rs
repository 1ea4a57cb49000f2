//! Compound admissibility rules
//!
//! A written form becomes an importable compound for a target level when it
//! passes, in order:
//!
//! 1. the level's length gate (raw character count, kana included),
//! 2. the per-character gate (every kanji must have a known level that is no
//!    stronger than the target),
//! 3. at the weakest level, an exact two-kanji count,
//! 4. the relevance gate (some kanji belongs to the set being imported).
//!
//! Non-kanji characters stay in the word text but are ignored by gates 2-4.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compound::CompoundWord;
use crate::level::Level;
use crate::script::{is_kanji, kanji_of};

/// Why a written form was not admitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Character count outside the level's length gate
    Length(usize),
    /// A kanji with no known level
    UnknownCharacter(char),
    /// A kanji whose level is stronger than the import target
    TooAdvanced { character: char, level: Level },
    /// Wrong number of kanji for a level that fixes it
    KanjiCount(usize),
    /// No kanji from the current import set
    Irrelevant,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length(len) => write!(f, "length {} outside level range", len),
            Self::UnknownCharacter(c) => write!(f, "unknown character {}", c),
            Self::TooAdvanced { character, level } => {
                write!(f, "character {} is {}", character, level)
            }
            Self::KanjiCount(count) => write!(f, "{} kanji", count),
            Self::Irrelevant => write!(f, "no kanji from the current level"),
        }
    }
}

/// Per-reason rejection counts for one import run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionStats {
    pub length: usize,
    pub unknown_character: usize,
    pub too_advanced: usize,
    pub kanji_count: usize,
    pub irrelevant: usize,
}

impl RejectionStats {
    pub fn record(&mut self, rejection: &Rejection) {
        match rejection {
            Rejection::Length(_) => self.length += 1,
            Rejection::UnknownCharacter(_) => self.unknown_character += 1,
            Rejection::TooAdvanced { .. } => self.too_advanced += 1,
            Rejection::KanjiCount(_) => self.kanji_count += 1,
            Rejection::Irrelevant => self.irrelevant += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.length + self.unknown_character + self.too_advanced + self.kanji_count + self.irrelevant
    }
}

/// Classifier for one import run.
///
/// Holds the character→level map and the set of characters being imported;
/// both are read-only for the lifetime of the run.
#[derive(Debug, Clone)]
pub struct Classifier {
    target: Level,
    levels: HashMap<char, Level>,
    current: HashSet<char>,
}

impl Classifier {
    pub fn new(
        target: Level,
        levels: HashMap<char, Level>,
        current: impl IntoIterator<Item = char>,
    ) -> Self {
        Self {
            target,
            levels,
            current: current.into_iter().collect(),
        }
    }

    pub fn target(&self) -> Level {
        self.target
    }

    /// Decide whether `word` is admissible and, if so, return its ordered
    /// qualifying characters.
    pub fn classify(&self, word: &str) -> Result<Vec<char>, Rejection> {
        let length = word.chars().count();
        if !self.target.word_length().contains(&length) {
            return Err(Rejection::Length(length));
        }

        let mut kanji_count = 0;
        for c in kanji_of(word) {
            kanji_count += 1;
            match self.levels.get(&c) {
                None => return Err(Rejection::UnknownCharacter(c)),
                Some(level) if *level > self.target => {
                    return Err(Rejection::TooAdvanced {
                        character: c,
                        level: *level,
                    })
                }
                Some(_) => {}
            }
        }

        if let Some(required) = self.target.required_kanji() {
            if kanji_count != required {
                return Err(Rejection::KanjiCount(kanji_count));
            }
        }

        if !kanji_of(word).any(|c| self.current.contains(&c)) {
            return Err(Rejection::Irrelevant);
        }

        let characters: Vec<char> = word
            .chars()
            .filter(|c| is_kanji(*c) && self.levels.contains_key(c))
            .collect();

        // Relevance guarantees at least one qualifying kanji
        debug_assert!(!characters.is_empty());
        Ok(characters)
    }

    /// Classify `word` and build the compound carrying its dictionary data
    pub fn compound(
        &self,
        word: &str,
        reading: &str,
        meaning: &str,
    ) -> Result<CompoundWord, Rejection> {
        let characters = self.classify(word)?;
        Ok(CompoundWord {
            word: word.to_string(),
            reading: reading.to_string(),
            meaning: meaning.to_string(),
            characters,
        })
    }
}
