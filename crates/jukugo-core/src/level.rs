//! Proficiency levels

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// JLPT proficiency level, ordered from weakest to strongest.
///
/// The derived ordering is the one the classifier relies on: `N5 < N4 < ... < N1`,
/// so "no stronger than the target" is `level <= target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    N5,
    N4,
    N3,
    N2,
    N1,
}

impl Level {
    /// All levels, weakest first
    pub const ALL: [Level; 5] = [Level::N5, Level::N4, Level::N3, Level::N2, Level::N1];

    /// The weakest level
    pub const WEAKEST: Level = Level::N5;

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::N5 => "N5",
            Level::N4 => "N4",
            Level::N3 => "N3",
            Level::N2 => "N2",
            Level::N1 => "N1",
        }
    }

    /// Zero-based rank, 0 for N5 through 4 for N1
    pub fn rank(&self) -> usize {
        *self as usize
    }

    pub fn description(&self) -> &'static str {
        match self {
            Level::N5 => "N5 (Beginner)",
            Level::N4 => "N4 (Elementary)",
            Level::N3 => "N3 (Intermediate)",
            Level::N2 => "N2 (Upper Intermediate)",
            Level::N1 => "N1 (Advanced)",
        }
    }

    /// Admissible word length (in characters, kana included) for compounds
    /// imported at this level.
    pub fn word_length(&self) -> RangeInclusive<usize> {
        match self {
            Level::N5 => 2..=3,
            Level::N4 => 1..=3,
            Level::N3 | Level::N2 | Level::N1 => 1..=4,
        }
    }

    /// Exact number of kanji a compound must contain at this level, if constrained
    pub fn required_kanji(&self) -> Option<usize> {
        match self {
            Level::N5 => Some(2),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    /// Accepts `N5`, `n5` or the bare digit `5`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('N')
            .or_else(|| trimmed.strip_prefix('n'))
            .unwrap_or(trimmed);
        match digits {
            "5" => Ok(Level::N5),
            "4" => Ok(Level::N4),
            "3" => Ok(Level::N3),
            "2" => Ok(Level::N2),
            "1" => Ok(Level::N1),
            _ => Err(Error::InvalidLevel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::N5 < Level::N4);
        assert!(Level::N2 < Level::N1);
        assert_eq!(Level::ALL.iter().max(), Some(&Level::N1));
        assert_eq!(Level::WEAKEST, Level::N5);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("N5".parse::<Level>().unwrap(), Level::N5);
        assert_eq!("n3".parse::<Level>().unwrap(), Level::N3);
        assert_eq!("1".parse::<Level>().unwrap(), Level::N1);
        assert!("N6".parse::<Level>().is_err());
        assert!("".parse::<Level>().is_err());
    }

    #[test]
    fn test_word_length_gate() {
        assert!(!Level::N5.word_length().contains(&1));
        assert!(Level::N5.word_length().contains(&3));
        assert!(!Level::N4.word_length().contains(&4));
        assert!(Level::N1.word_length().contains(&4));
    }

    #[test]
    fn test_serde_roundtrip_uses_level_name() {
        let json = serde_json::to_string(&Level::N4).unwrap();
        assert_eq!(json, "\"N4\"");
    }
}
