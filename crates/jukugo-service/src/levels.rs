//! Character level sources
//!
//! The importer never owns the character→level assignment. It asks a
//! [`LevelSource`] for a fresh copy at the start of every run.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use jukugo_core::{is_kanji, Level};

use crate::error::{ServiceError, ServiceResult};

/// Supplies the level of every known character
#[async_trait]
pub trait LevelSource: Send + Sync {
    /// Every known character and its level
    async fn character_levels(&self) -> ServiceResult<HashMap<char, Level>>;

    /// Characters assigned to `level`, ordered and without duplicates
    async fn characters_at(&self, level: Level) -> ServiceResult<Vec<char>> {
        let levels = self.character_levels().await?;
        Ok(at_level(&levels, level))
    }
}

fn at_level(levels: &HashMap<char, Level>, level: Level) -> Vec<char> {
    levels
        .iter()
        .filter(|(_, l)| **l == level)
        .map(|(c, _)| *c)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Fixed in-memory assignment
#[derive(Debug, Clone, Default)]
pub struct StaticLevelSource {
    levels: HashMap<char, Level>,
}

impl StaticLevelSource {
    pub fn new(levels: HashMap<char, Level>) -> Self {
        Self { levels }
    }

    pub fn insert(&mut self, glyph: char, level: Level) {
        self.levels.insert(glyph, level);
    }
}

impl FromIterator<(char, Level)> for StaticLevelSource {
    fn from_iter<I: IntoIterator<Item = (char, Level)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[async_trait]
impl LevelSource for StaticLevelSource {
    async fn character_levels(&self) -> ServiceResult<HashMap<char, Level>> {
        Ok(self.levels.clone())
    }
}

/// Level file in `glyph<TAB>level` format, re-read on every call.
///
/// Blank lines and lines starting with `#` are ignored. Lines that do not
/// hold a single kanji and a recognised level are skipped with a warning.
/// A glyph listed twice keeps its last level.
#[derive(Debug, Clone)]
pub struct TsvLevelSource {
    path: PathBuf,
}

impl TsvLevelSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse level file contents
    pub fn parse(content: &str) -> HashMap<char, Level> {
        let mut levels = HashMap::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_line(line) {
                Some((glyph, level)) => {
                    levels.insert(glyph, level);
                }
                None => {
                    tracing::warn!(line = index + 1, content = line, "Skipping malformed level line");
                }
            }
        }

        levels
    }
}

fn parse_line(line: &str) -> Option<(char, Level)> {
    let mut parts = line.split('\t');
    let glyph = parts.next()?.trim();
    let level = parts.next()?.trim().parse::<Level>().ok()?;

    let mut chars = glyph.chars();
    let c = chars.next()?;
    if chars.next().is_some() || !is_kanji(c) {
        return None;
    }
    Some((c, level))
}

#[async_trait]
impl LevelSource for TsvLevelSource {
    async fn character_levels(&self) -> ServiceResult<HashMap<char, Level>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ServiceError::Levels(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        let levels = Self::parse(&content);
        tracing::debug!(path = %self.path.display(), count = levels.len(), "Loaded character levels");
        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_garbage() {
        let content = "# kanji levels\n木\tN5\n林\t5\n\n山\tN9\nかな\tN5\n森 N4\n会\tn4\n";
        let levels = TsvLevelSource::parse(content);

        assert_eq!(levels.len(), 3);
        assert_eq!(levels[&'木'], Level::N5);
        assert_eq!(levels[&'林'], Level::N5);
        assert_eq!(levels[&'会'], Level::N4);
        assert!(!levels.contains_key(&'山'));
    }

    #[test]
    fn test_last_assignment_wins() {
        let levels = TsvLevelSource::parse("木\tN5\n木\tN3\n");
        assert_eq!(levels[&'木'], Level::N3);
    }

    #[tokio::test]
    async fn test_characters_at_is_sorted_and_filtered() {
        let source: StaticLevelSource = [('林', Level::N5), ('木', Level::N5), ('会', Level::N4)]
            .into_iter()
            .collect();

        let n5 = source.characters_at(Level::N5).await.unwrap();
        let mut expected = vec!['木', '林'];
        expected.sort();
        assert_eq!(n5, expected);
        assert_eq!(source.characters_at(Level::N4).await.unwrap(), vec!['会']);
        assert!(source.characters_at(Level::N1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_level_error() {
        let source = TsvLevelSource::new("/nonexistent/levels.tsv");
        let err = source.character_levels().await.unwrap_err();
        assert!(matches!(err, ServiceError::Levels(_)));
    }
}
