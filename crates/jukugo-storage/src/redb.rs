//! ReDB storage backend

use crate::error::{StorageError, StorageResult};
use crate::migration::Migratable;
use crate::traits::{assemble_entry, GraphStore, IngestBatch, IngestOutcome};
use async_trait::async_trait;
use jukugo_core::{CharacterNode, CompoundEntry, FormsEdge, GraphStats, Level, WordNode};
use redb::{
    Database, ReadableTable, ReadableTableMetadata, TableDefinition, WriteTransaction,
};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

// Table definitions
const CHARACTERS: TableDefinition<&str, &[u8]> = TableDefinition::new("characters");
const WORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("words");
/// `glyph SEP word` -> position
const FORMS: TableDefinition<&str, u32> = TableDefinition::new("forms");
/// `word SEP glyph` -> position, the reverse index of FORMS
const WORD_FORMS: TableDefinition<&str, u32> = TableDefinition::new("word_forms");
const META: TableDefinition<&str, u32> = TableDefinition::new("meta");

const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Separator for composite keys. Never appears in dictionary text.
const SEP: char = '\u{1f}';

/// ReDB storage backend
pub struct RedbStorage {
    db: Mutex<Database>,
}

impl RedbStorage {
    /// Open or create a ReDB database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path).map_err(|e| StorageError::Database(e.to_string()))?;
        let storage = Self { db: Mutex::new(db) };
        storage.migrate_to_latest()?;
        Ok(storage)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn ensure_tables(txn: &WriteTransaction) -> StorageResult<()> {
        txn.open_table(CHARACTERS)?;
        txn.open_table(WORDS)?;
        txn.open_table(FORMS)?;
        txn.open_table(WORD_FORMS)?;
        txn.open_table(META)?;
        Ok(())
    }

    fn forms_key(glyph: char, word: &str) -> String {
        format!("{}{}{}", glyph, SEP, word)
    }

    fn word_forms_key(word: &str, glyph: char) -> String {
        format!("{}{}{}", word, SEP, glyph)
    }

    fn apply(
        txn: &WriteTransaction,
        batch: &IngestBatch<'_>,
        cancel: &CancellationToken,
    ) -> StorageResult<IngestOutcome> {
        let mut characters = txn.open_table(CHARACTERS)?;
        let mut words = txn.open_table(WORDS)?;
        let mut forms = txn.open_table(FORMS)?;
        let mut word_forms = txn.open_table(WORD_FORMS)?;
        let mut outcome = IngestOutcome::default();

        for glyph in batch.characters {
            if cancel.is_cancelled() {
                return Err(StorageError::Cancelled);
            }
            let node = CharacterNode::new(*glyph, batch.level);
            let value = serde_json::to_vec(&node)?;
            characters.insert(glyph.to_string().as_str(), value.as_slice())?;
            outcome.characters_merged += 1;
        }

        for compound in batch.compounds {
            if cancel.is_cancelled() {
                return Err(StorageError::Cancelled);
            }
            let value = serde_json::to_vec(&compound.to_word_node())?;
            words.insert(compound.word.as_str(), value.as_slice())?;
            outcome.words_merged += 1;

            for edge in compound.edges() {
                if characters.get(edge.character.to_string().as_str())?.is_none() {
                    outcome.edges_skipped += 1;
                    continue;
                }
                let key = Self::forms_key(edge.character, &edge.word);
                forms.insert(key.as_str(), edge.position)?;
                let key = Self::word_forms_key(&edge.word, edge.character);
                word_forms.insert(key.as_str(), edge.position)?;
                outcome.edges_merged += 1;
            }
        }

        Ok(outcome)
    }

    fn edges_for_character(
        table: &impl ReadableTable<&'static str, u32>,
        glyph: char,
    ) -> StorageResult<Vec<FormsEdge>> {
        let prefix = format!("{}{}", glyph, SEP);
        let mut edges = Vec::new();
        for entry in table.range(prefix.as_str()..)? {
            let (key, position) = entry?;
            let Some(word) = key.value().strip_prefix(prefix.as_str()) else {
                break;
            };
            edges.push(FormsEdge::new(glyph, word, position.value()));
        }
        Ok(edges)
    }

    fn edges_for_word(
        table: &impl ReadableTable<&'static str, u32>,
        text: &str,
    ) -> StorageResult<Vec<FormsEdge>> {
        let prefix = format!("{}{}", text, SEP);
        let mut edges = Vec::new();
        for entry in table.range(prefix.as_str()..)? {
            let (key, position) = entry?;
            let Some(rest) = key.value().strip_prefix(prefix.as_str()) else {
                break;
            };
            let glyph = rest.chars().next().ok_or_else(|| {
                StorageError::InvalidData(format!("empty glyph in edge key for {}", text))
            })?;
            edges.push(FormsEdge::new(glyph, text, position.value()));
        }
        edges.sort_by_key(|e| e.position);
        Ok(edges)
    }

    fn decode_word(
        table: &impl ReadableTable<&'static str, &'static [u8]>,
        text: &str,
    ) -> StorageResult<Option<WordNode>> {
        match table.get(text)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }
}

impl Migratable for RedbStorage {
    fn get_schema_version(&self) -> StorageResult<u32> {
        let db = self.lock()?;
        let read_txn = db.begin_read()?;
        let table = match read_txn.open_table(META) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let version = table.get(SCHEMA_VERSION_KEY)?.map(|v| v.value());
        Ok(version.unwrap_or(0))
    }

    fn set_schema_version(&self, version: u32) -> StorageResult<()> {
        let db = self.lock()?;
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(META)?;
            table.insert(SCHEMA_VERSION_KEY, version)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn run_migration(&self, version: u32) -> StorageResult<()> {
        match version {
            1 => {
                let db = self.lock()?;
                let write_txn = db.begin_write()?;
                Self::ensure_tables(&write_txn)?;
                write_txn.commit()?;
                Ok(())
            }
            _ => Err(StorageError::Migration(format!(
                "Unknown migration version: {}",
                version
            ))),
        }
    }
}

#[async_trait]
impl GraphStore for RedbStorage {
    async fn initialize(&self) -> StorageResult<()> {
        self.migrate_to_latest()?;
        let db = self.lock()?;
        let write_txn = db.begin_write()?;
        Self::ensure_tables(&write_txn)?;
        write_txn.commit()?;
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        let db = self.lock()?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(META)?;
        Ok(table.get(SCHEMA_VERSION_KEY)?.is_some())
    }

    async fn ingest(
        &self,
        batch: &IngestBatch<'_>,
        cancel: &CancellationToken,
    ) -> StorageResult<IngestOutcome> {
        let db = self.lock()?;
        let write_txn = db.begin_write()?;

        match Self::apply(&write_txn, batch, cancel) {
            Ok(outcome) => {
                write_txn.commit()?;
                tracing::debug!(
                    characters = outcome.characters_merged,
                    words = outcome.words_merged,
                    edges = outcome.edges_merged,
                    "Ingested batch in single transaction"
                );
                Ok(outcome)
            }
            Err(e) => {
                write_txn.abort()?;
                Err(e)
            }
        }
    }

    async fn wipe(&self) -> StorageResult<()> {
        let db = self.lock()?;
        let write_txn = db.begin_write()?;
        write_txn.delete_table(CHARACTERS)?;
        write_txn.delete_table(WORDS)?;
        write_txn.delete_table(FORMS)?;
        write_txn.delete_table(WORD_FORMS)?;
        Self::ensure_tables(&write_txn)?;
        write_txn.commit()?;
        Ok(())
    }

    async fn get_character(&self, glyph: char) -> StorageResult<Option<CharacterNode>> {
        let db = self.lock()?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(CHARACTERS)?;

        if let Some(value) = table.get(glyph.to_string().as_str())? {
            Ok(Some(serde_json::from_slice(value.value())?))
        } else {
            Ok(None)
        }
    }

    async fn get_word(&self, text: &str) -> StorageResult<Option<WordNode>> {
        let db = self.lock()?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(WORDS)?;
        Self::decode_word(&table, text)
    }

    async fn characters_at_level(&self, level: Level) -> StorageResult<Vec<CharacterNode>> {
        let db = self.lock()?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(CHARACTERS)?;

        let mut characters = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let node: CharacterNode = serde_json::from_slice(value.value())?;
            if node.level == level {
                characters.push(node);
            }
        }

        Ok(characters)
    }

    async fn forms_for_character(&self, glyph: char) -> StorageResult<Vec<FormsEdge>> {
        let db = self.lock()?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(FORMS)?;
        Self::edges_for_character(&table, glyph)
    }

    async fn forms_for_word(&self, text: &str) -> StorageResult<Vec<FormsEdge>> {
        let db = self.lock()?;
        let read_txn = db.begin_read()?;
        let table = read_txn.open_table(WORD_FORMS)?;
        Self::edges_for_word(&table, text)
    }

    async fn validate_compound(
        &self,
        glyph: char,
        word: &str,
        position: u32,
    ) -> StorageResult<Option<WordNode>> {
        let db = self.lock()?;
        let read_txn = db.begin_read()?;
        let forms = read_txn.open_table(FORMS)?;

        let stored = forms
            .get(Self::forms_key(glyph, word).as_str())?
            .map(|v| v.value());
        if stored != Some(position) {
            return Ok(None);
        }

        let words = read_txn.open_table(WORDS)?;
        Self::decode_word(&words, word)
    }

    async fn stats(&self) -> StorageResult<GraphStats> {
        let db = self.lock()?;
        let read_txn = db.begin_read()?;

        Ok(GraphStats {
            characters: read_txn.open_table(CHARACTERS)?.len()? as usize,
            words: read_txn.open_table(WORDS)?.len()? as usize,
            forms: read_txn.open_table(FORMS)?.len()? as usize,
        })
    }

    async fn compounds_for_character(&self, glyph: char) -> StorageResult<Vec<CompoundEntry>> {
        let db = self.lock()?;
        let read_txn = db.begin_read()?;
        let forms = read_txn.open_table(FORMS)?;
        let word_forms = read_txn.open_table(WORD_FORMS)?;
        let words = read_txn.open_table(WORDS)?;

        // Keys sort by word text within a glyph prefix
        let mut entries = Vec::new();
        for edge in Self::edges_for_character(&forms, glyph)? {
            let Some(word) = Self::decode_word(&words, &edge.word)? else {
                continue;
            };
            let edges = Self::edges_for_word(&word_forms, &edge.word)?;
            entries.push(assemble_entry(glyph, edge.position, word, &edges));
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jukugo_core::CompoundWord;
    use tempfile::tempdir;

    fn compound(word: &str, characters: &[char]) -> CompoundWord {
        CompoundWord {
            word: word.to_string(),
            reading: "よみ".to_string(),
            meaning: "meaning".to_string(),
            characters: characters.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_redb_storage() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.redb");

        let storage = RedbStorage::open(&db_path).unwrap();
        storage.initialize().await.unwrap();
        assert!(storage.health_check().await.unwrap());

        let compounds = vec![compound("木林", &['木', '林']), compound("林木", &['林', '木'])];
        let batch = IngestBatch {
            level: Level::N5,
            characters: &['木', '林'],
            compounds: &compounds,
        };
        storage
            .ingest(&batch, &CancellationToken::new())
            .await
            .unwrap();

        let entries = storage.compounds_for_character('木').await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].word, "木林");
        assert_eq!(entries[0].position, 0);
        assert_eq!(entries[1].word, "林木");
        assert_eq!(entries[1].position, 1);

        assert!(storage
            .validate_compound('林', "木林", 1)
            .await
            .unwrap()
            .is_some());
        assert!(storage
            .validate_compound('林', "木林", 0)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_reopen_keeps_schema_version() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.redb");

        {
            let storage = RedbStorage::open(&db_path).unwrap();
            assert_eq!(storage.get_schema_version().unwrap(), 1);
        }

        let storage = RedbStorage::open(&db_path).unwrap();
        assert_eq!(storage.get_schema_version().unwrap(), 1);
        assert!(storage.stats().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wipe_clears_graph_but_keeps_schema() {
        let dir = tempdir().unwrap();
        let storage = RedbStorage::open(dir.path().join("test.redb")).unwrap();

        let compounds = vec![compound("木林", &['木', '林'])];
        let batch = IngestBatch {
            level: Level::N5,
            characters: &['木', '林'],
            compounds: &compounds,
        };
        storage
            .ingest(&batch, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(storage.stats().await.unwrap().forms, 2);

        storage.wipe().await.unwrap();
        assert!(storage.stats().await.unwrap().is_empty());
        assert_eq!(storage.get_schema_version().unwrap(), 1);
    }
}
