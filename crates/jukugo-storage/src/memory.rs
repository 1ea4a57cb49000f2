//! In-memory storage backend for testing

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use jukugo_core::{CharacterNode, CompoundEntry, FormsEdge, GraphStats, Level, WordNode};
use tokio_util::sync::CancellationToken;

use crate::error::{StorageError, StorageResult};
use crate::traits::{assemble_entry, GraphStore, IngestBatch, IngestOutcome};

#[derive(Debug, Clone, Default)]
struct GraphState {
    characters: BTreeMap<char, CharacterNode>,
    words: BTreeMap<String, WordNode>,
    /// (character, word) -> position
    forms: BTreeMap<(char, String), u32>,
    /// (word, character) -> position
    word_forms: BTreeMap<(String, char), u32>,
}

impl GraphState {
    fn merge_edge(&mut self, edge: FormsEdge) {
        self.word_forms
            .insert((edge.word.clone(), edge.character), edge.position);
        self.forms.insert((edge.character, edge.word), edge.position);
    }

    fn forms_for_word(&self, text: &str) -> Vec<FormsEdge> {
        let mut edges: Vec<FormsEdge> = self
            .word_forms
            .range((text.to_string(), '\0')..)
            .take_while(|((word, _), _)| word == text)
            .map(|((word, c), position)| FormsEdge::new(*c, word, *position))
            .collect();
        edges.sort_by_key(|e| e.position);
        edges
    }

    fn forms_for_character(&self, glyph: char) -> Vec<FormsEdge> {
        self.forms
            .range((glyph, String::new())..)
            .take_while(|((c, _), _)| *c == glyph)
            .map(|((c, word), position)| FormsEdge::new(*c, word, *position))
            .collect()
    }
}

/// In-memory storage backend
///
/// Useful for testing and temporary graphs. An ingest is applied to a staged
/// copy and swapped in whole, so a cancelled ingest leaves no trace.
pub struct MemoryStorage {
    state: RwLock<GraphState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(GraphState::default()),
        }
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, GraphState>> {
        self.state
            .read()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, GraphState>> {
        self.state
            .write()
            .map_err(|e| StorageError::Database(format!("Lock error: {}", e)))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for MemoryStorage {
    async fn initialize(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        Ok(true)
    }

    async fn ingest(
        &self,
        batch: &IngestBatch<'_>,
        cancel: &CancellationToken,
    ) -> StorageResult<IngestOutcome> {
        let mut state = self.write()?;
        let mut staged = state.clone();
        let mut outcome = IngestOutcome::default();

        for glyph in batch.characters {
            if cancel.is_cancelled() {
                return Err(StorageError::Cancelled);
            }
            staged
                .characters
                .insert(*glyph, CharacterNode::new(*glyph, batch.level));
            outcome.characters_merged += 1;
        }

        for compound in batch.compounds {
            if cancel.is_cancelled() {
                return Err(StorageError::Cancelled);
            }
            staged
                .words
                .insert(compound.word.clone(), compound.to_word_node());
            outcome.words_merged += 1;

            for edge in compound.edges() {
                if staged.characters.contains_key(&edge.character) {
                    staged.merge_edge(edge);
                    outcome.edges_merged += 1;
                } else {
                    outcome.edges_skipped += 1;
                }
            }
        }

        *state = staged;
        Ok(outcome)
    }

    async fn wipe(&self) -> StorageResult<()> {
        let mut state = self.write()?;
        *state = GraphState::default();
        Ok(())
    }

    async fn get_character(&self, glyph: char) -> StorageResult<Option<CharacterNode>> {
        Ok(self.read()?.characters.get(&glyph).cloned())
    }

    async fn get_word(&self, text: &str) -> StorageResult<Option<WordNode>> {
        Ok(self.read()?.words.get(text).cloned())
    }

    async fn characters_at_level(&self, level: Level) -> StorageResult<Vec<CharacterNode>> {
        Ok(self
            .read()?
            .characters
            .values()
            .filter(|c| c.level == level)
            .cloned()
            .collect())
    }

    async fn forms_for_character(&self, glyph: char) -> StorageResult<Vec<FormsEdge>> {
        Ok(self.read()?.forms_for_character(glyph))
    }

    async fn forms_for_word(&self, text: &str) -> StorageResult<Vec<FormsEdge>> {
        Ok(self.read()?.forms_for_word(text))
    }

    async fn validate_compound(
        &self,
        glyph: char,
        word: &str,
        position: u32,
    ) -> StorageResult<Option<WordNode>> {
        let state = self.read()?;
        match state.forms.get(&(glyph, word.to_string())) {
            Some(p) if *p == position => Ok(state.words.get(word).cloned()),
            _ => Ok(None),
        }
    }

    async fn stats(&self) -> StorageResult<GraphStats> {
        let state = self.read()?;
        Ok(GraphStats {
            characters: state.characters.len(),
            words: state.words.len(),
            forms: state.forms.len(),
        })
    }

    async fn compounds_for_character(&self, glyph: char) -> StorageResult<Vec<CompoundEntry>> {
        let state = self.read()?;
        // BTreeMap order already sorts edges by word text
        Ok(state
            .forms_for_character(glyph)
            .into_iter()
            .filter_map(|edge| {
                let word = state.words.get(&edge.word)?.clone();
                let forms = state.forms_for_word(&edge.word);
                Some(assemble_entry(glyph, edge.position, word, &forms))
            })
            .collect())
    }
}
