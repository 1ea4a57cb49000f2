//! Storage backend trait definitions

use async_trait::async_trait;
use jukugo_core::{
    CoCharacter, CompoundEntry, CompoundWord, FormsEdge, GraphStats, Level, WordNode,
    CharacterNode,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::StorageResult;

/// Everything one import run writes
#[derive(Debug, Clone, Copy)]
pub struct IngestBatch<'a> {
    /// Level stamped onto every character in `characters`
    pub level: Level,
    /// Characters assigned to `level`
    pub characters: &'a [char],
    pub compounds: &'a [CompoundWord],
}

/// Counts of what an ingest wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub characters_merged: usize,
    pub words_merged: usize,
    pub edges_merged: usize,
    /// Edges not written because their Character node does not exist
    pub edges_skipped: usize,
}

/// Trait for graph storage backends.
///
/// Writes are merges: a node is created if its key is absent and its
/// attributes are overwritten otherwise; a FORMS edge is unique per
/// (character, word) pair and re-ingest overwrites its position.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Set up tables and indexes. Safe to call on an initialized store.
    async fn initialize(&self) -> StorageResult<()>;

    /// Health check
    async fn health_check(&self) -> StorageResult<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Write Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Merge a whole import in a single transaction.
    ///
    /// Characters are merged first. Each compound then merges its Word node
    /// and one edge per character; an edge whose Character node does not
    /// exist is skipped. If `cancel` fires before commit, nothing is written
    /// and `StorageError::Cancelled` is returned.
    async fn ingest(
        &self,
        batch: &IngestBatch<'_>,
        cancel: &CancellationToken,
    ) -> StorageResult<IngestOutcome>;

    /// Delete every node and edge
    async fn wipe(&self) -> StorageResult<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Read Operations
    // ─────────────────────────────────────────────────────────────────────────

    async fn get_character(&self, glyph: char) -> StorageResult<Option<CharacterNode>>;

    async fn get_word(&self, text: &str) -> StorageResult<Option<WordNode>>;

    /// Characters currently stamped with `level`, ordered by glyph
    async fn characters_at_level(&self, level: Level) -> StorageResult<Vec<CharacterNode>>;

    /// Edges leaving `glyph`, ordered by word
    async fn forms_for_character(&self, glyph: char) -> StorageResult<Vec<FormsEdge>>;

    /// Edges entering `word`, ordered by position
    async fn forms_for_word(&self, text: &str) -> StorageResult<Vec<FormsEdge>>;

    /// Word metadata if an edge `glyph -> word` exists with exactly
    /// `position`, read in one transaction
    async fn validate_compound(
        &self,
        glyph: char,
        word: &str,
        position: u32,
    ) -> StorageResult<Option<WordNode>>;

    async fn stats(&self) -> StorageResult<GraphStats>;

    // ─────────────────────────────────────────────────────────────────────────
    // Composite Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Compounds containing `glyph`, ordered by word text.
    ///
    /// The default composes the single-key reads above and may observe an
    /// in-progress import between them.
    async fn compounds_for_character(&self, glyph: char) -> StorageResult<Vec<CompoundEntry>> {
        let mut entries = Vec::new();
        for edge in self.forms_for_character(glyph).await? {
            let Some(word) = self.get_word(&edge.word).await? else {
                continue;
            };
            let forms = self.forms_for_word(&edge.word).await?;
            entries.push(assemble_entry(glyph, edge.position, word, &forms));
        }
        entries.sort_by(|a, b| a.word.cmp(&b.word));
        Ok(entries)
    }
}

/// Build a compound entry for `glyph` from its word and the word's edges
pub(crate) fn assemble_entry(
    glyph: char,
    position: u32,
    word: WordNode,
    forms: &[FormsEdge],
) -> CompoundEntry {
    let mut co_characters: Vec<CoCharacter> = forms
        .iter()
        .filter(|e| e.character != glyph)
        .map(|e| CoCharacter {
            character: e.character,
            position: e.position,
        })
        .collect();
    co_characters.sort_by_key(|c| (c.position, c.character));

    CompoundEntry {
        word: word.text,
        reading: word.reading,
        meaning: word.meaning,
        position,
        co_characters,
    }
}
