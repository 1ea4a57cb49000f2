//! Read path over the compound graph

use std::collections::HashMap;
use std::sync::Arc;

use jukugo_core::limits::{could_form, validate_character, validate_distractors, validate_word};
use jukugo_core::{
    is_kanji, CharacterChallenge, CharacterNode, CompoundEntry, CompoundValidation, GraphStats,
    Level,
};
use jukugo_storage::GraphStore;
use rand::seq::SliceRandom;

use crate::error::ServiceResult;

/// Graph queries with input validation.
///
/// Glyph arguments are raw strings as received from a caller and must hold
/// exactly one character. Characters, words and positions the graph cannot
/// hold give empty or negative results, never errors.
pub struct GraphQueries<S: GraphStore + ?Sized> {
    store: Arc<S>,
}

impl<S: GraphStore + ?Sized> Clone for GraphQueries<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: GraphStore + ?Sized> GraphQueries<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Compounds containing `glyph`, ordered by word text
    pub async fn compounds_for_character(&self, glyph: &str) -> ServiceResult<Vec<CompoundEntry>> {
        let glyph = validate_character(glyph)?;
        if !is_kanji(glyph) {
            return Ok(Vec::new());
        }
        Ok(self.store.compounds_for_character(glyph).await?)
    }

    /// Whether `glyph` sits at exactly `position` in `word`
    pub async fn validate_compound(
        &self,
        glyph: &str,
        word: &str,
        position: u32,
    ) -> ServiceResult<CompoundValidation> {
        let glyph = validate_character(glyph)?;
        validate_word(word)?;
        if !could_form(glyph, word, position) {
            return Ok(CompoundValidation::invalid());
        }

        let found = self.store.validate_compound(glyph, word, position).await?;
        Ok(CompoundValidation::from(found))
    }

    /// A uniformly chosen character at `level`, if any exist
    pub async fn random_character(&self, level: Level) -> ServiceResult<Option<CharacterNode>> {
        let characters = self.store.characters_at_level(level).await?;
        Ok(characters.choose(&mut rand::thread_rng()).cloned())
    }

    /// Up to `count` distinct characters at `level` other than `exclude`
    pub async fn distractors(
        &self,
        level: Level,
        exclude: char,
        count: usize,
    ) -> ServiceResult<Vec<CharacterNode>> {
        validate_distractors(count)?;
        let characters = self.store.characters_at_level(level).await?;
        Ok(pick_distractors(&characters, exclude, count))
    }

    /// A random character at `level` plus `count` distractors from the same
    /// level, all drawn from one read
    pub async fn random_challenge(
        &self,
        level: Level,
        count: usize,
    ) -> ServiceResult<Option<CharacterChallenge>> {
        validate_distractors(count)?;
        let characters = self.store.characters_at_level(level).await?;

        let Some(character) = characters.choose(&mut rand::thread_rng()).cloned() else {
            return Ok(None);
        };
        let distractors = pick_distractors(&characters, character.glyph, count);
        Ok(Some(CharacterChallenge {
            character,
            distractors,
        }))
    }

    /// Compounds of `glyph` whose every forming character is at or below
    /// `level`. Characters with no node count as too advanced.
    pub async fn compounds_at_level(
        &self,
        glyph: &str,
        level: Level,
    ) -> ServiceResult<Vec<CompoundEntry>> {
        let glyph = validate_character(glyph)?;
        match self.store.get_character(glyph).await? {
            Some(node) if node.level <= level => {}
            _ => return Ok(Vec::new()),
        }

        let entries = self.store.compounds_for_character(glyph).await?;
        let mut known: HashMap<char, Option<Level>> = HashMap::new();
        let mut kept = Vec::with_capacity(entries.len());

        for entry in entries {
            let mut admissible = true;
            for co in &entry.co_characters {
                let co_level = match known.get(&co.character) {
                    Some(cached) => *cached,
                    None => {
                        let fetched = self
                            .store
                            .get_character(co.character)
                            .await?
                            .map(|n| n.level);
                        known.insert(co.character, fetched);
                        fetched
                    }
                };
                if !matches!(co_level, Some(l) if l <= level) {
                    admissible = false;
                    break;
                }
            }
            if admissible {
                kept.push(entry);
            }
        }

        Ok(kept)
    }

    pub async fn stats(&self) -> ServiceResult<GraphStats> {
        Ok(self.store.stats().await?)
    }

    /// Delete every node and edge. Callers gate this behind an explicit opt-in.
    pub async fn wipe(&self) -> ServiceResult<()> {
        self.store.wipe().await?;
        tracing::warn!("Graph wiped");
        Ok(())
    }
}

fn pick_distractors(characters: &[CharacterNode], exclude: char, count: usize) -> Vec<CharacterNode> {
    let pool: Vec<&CharacterNode> = characters.iter().filter(|c| c.glyph != exclude).collect();
    pool.choose_multiple(&mut rand::thread_rng(), count)
        .map(|c| (*c).clone())
        .collect()
}
