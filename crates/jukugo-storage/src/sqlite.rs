//! SQLite storage backend

use crate::error::{StorageError, StorageResult};
use crate::migration::Migratable;
use crate::traits::{assemble_entry, GraphStore, IngestBatch, IngestOutcome};
use async_trait::async_trait;
use jukugo_core::{CharacterNode, CompoundEntry, FormsEdge, GraphStats, Level, WordNode};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

const SCHEMA_V1: &str = r#"
    CREATE TABLE IF NOT EXISTS characters (
        glyph TEXT PRIMARY KEY,
        level TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS words (
        text TEXT PRIMARY KEY,
        reading TEXT NOT NULL,
        meaning TEXT NOT NULL,
        length INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS forms (
        glyph TEXT NOT NULL,
        word TEXT NOT NULL,
        position INTEGER NOT NULL,
        PRIMARY KEY (glyph, word)
    );

    CREATE INDEX IF NOT EXISTS idx_characters_level ON characters(level);
    CREATE INDEX IF NOT EXISTS idx_forms_word ON forms(word);
"#;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open or create a SQLite database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path).map_err(|e| StorageError::Database(e.to_string()))?;

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.migrate_to_latest()?;

        Ok(storage)
    }

    /// Create an in-memory SQLite database (for testing)
    pub fn in_memory() -> StorageResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| StorageError::Database(e.to_string()))?;

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.migrate_to_latest()?;

        Ok(storage)
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn apply(
        tx: &Transaction<'_>,
        batch: &IngestBatch<'_>,
        cancel: &CancellationToken,
    ) -> StorageResult<IngestOutcome> {
        let mut outcome = IngestOutcome::default();

        let mut merge_character = tx.prepare(
            "INSERT INTO characters (glyph, level) VALUES (?1, ?2)
             ON CONFLICT(glyph) DO UPDATE SET level = excluded.level",
        )?;
        let mut merge_word = tx.prepare(
            "INSERT INTO words (text, reading, meaning, length) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(text) DO UPDATE SET
                reading = excluded.reading,
                meaning = excluded.meaning,
                length = excluded.length",
        )?;
        // Only matches an existing character; never creates one
        let mut merge_edge = tx.prepare(
            "INSERT INTO forms (glyph, word, position)
             SELECT ?1, ?2, ?3 WHERE EXISTS (SELECT 1 FROM characters WHERE glyph = ?1)
             ON CONFLICT(glyph, word) DO UPDATE SET position = excluded.position",
        )?;

        for glyph in batch.characters {
            if cancel.is_cancelled() {
                return Err(StorageError::Cancelled);
            }
            merge_character.execute(params![glyph.to_string(), batch.level.as_str()])?;
            outcome.characters_merged += 1;
        }

        for compound in batch.compounds {
            if cancel.is_cancelled() {
                return Err(StorageError::Cancelled);
            }
            let node = compound.to_word_node();
            merge_word.execute(params![
                node.text,
                node.reading,
                node.meaning,
                node.length as i64
            ])?;
            outcome.words_merged += 1;

            for edge in compound.edges() {
                let changed = merge_edge.execute(params![
                    edge.character.to_string(),
                    edge.word,
                    edge.position
                ])?;
                if changed == 0 {
                    outcome.edges_skipped += 1;
                } else {
                    outcome.edges_merged += 1;
                }
            }
        }

        Ok(outcome)
    }

    fn parse_glyph(text: &str) -> StorageResult<char> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(StorageError::InvalidData(format!(
                "stored glyph is not a single character: {:?}",
                text
            ))),
        }
    }

    fn parse_level(text: &str) -> StorageResult<Level> {
        text.parse()
            .map_err(|e: jukugo_core::Error| StorageError::InvalidData(e.to_string()))
    }

    fn query_word(conn: &Connection, text: &str) -> StorageResult<Option<WordNode>> {
        let row = conn
            .query_row(
                "SELECT text, reading, meaning, length FROM words WHERE text = ?1",
                params![text],
                |row| {
                    Ok(WordNode {
                        text: row.get(0)?,
                        reading: row.get(1)?,
                        meaning: row.get(2)?,
                        length: row.get::<_, i64>(3)? as usize,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn query_forms_for_word(conn: &Connection, text: &str) -> StorageResult<Vec<FormsEdge>> {
        let mut stmt =
            conn.prepare("SELECT glyph, position FROM forms WHERE word = ?1 ORDER BY position")?;
        let rows = stmt.query_map(params![text], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })?;

        let mut edges = Vec::new();
        for row in rows {
            let (glyph, position) = row?;
            edges.push(FormsEdge::new(Self::parse_glyph(&glyph)?, text, position));
        }
        Ok(edges)
    }
}

impl Migratable for SqliteStorage {
    fn get_schema_version(&self) -> StorageResult<u32> {
        let conn = self.lock()?;
        let version: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(version)
    }

    fn set_schema_version(&self, version: u32) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.pragma_update(None, "user_version", version)?;
        Ok(())
    }

    fn run_migration(&self, version: u32) -> StorageResult<()> {
        match version {
            1 => {
                let conn = self.lock()?;
                conn.execute_batch(SCHEMA_V1)
                    .map_err(|e| StorageError::Migration(e.to_string()))
            }
            _ => Err(StorageError::Migration(format!(
                "Unknown migration version: {}",
                version
            ))),
        }
    }
}

#[async_trait]
impl GraphStore for SqliteStorage {
    async fn initialize(&self) -> StorageResult<()> {
        self.migrate_to_latest()?;
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA_V1)?;
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        let conn = self.lock()?;
        let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0))?;
        Ok(one == 1)
    }

    async fn ingest(
        &self,
        batch: &IngestBatch<'_>,
        cancel: &CancellationToken,
    ) -> StorageResult<IngestOutcome> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        // Dropping `tx` without commit rolls back
        let outcome = Self::apply(&tx, batch, cancel)?;
        tx.commit()?;

        tracing::debug!(
            characters = outcome.characters_merged,
            words = outcome.words_merged,
            edges = outcome.edges_merged,
            "Ingested batch in single transaction"
        );
        Ok(outcome)
    }

    async fn wipe(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "BEGIN;
             DELETE FROM forms;
             DELETE FROM words;
             DELETE FROM characters;
             COMMIT;",
        )?;
        Ok(())
    }

    async fn get_character(&self, glyph: char) -> StorageResult<Option<CharacterNode>> {
        let conn = self.lock()?;
        let level: Option<String> = conn
            .query_row(
                "SELECT level FROM characters WHERE glyph = ?1",
                params![glyph.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match level {
            Some(level) => Ok(Some(CharacterNode::new(glyph, Self::parse_level(&level)?))),
            None => Ok(None),
        }
    }

    async fn get_word(&self, text: &str) -> StorageResult<Option<WordNode>> {
        let conn = self.lock()?;
        Self::query_word(&conn, text)
    }

    async fn characters_at_level(&self, level: Level) -> StorageResult<Vec<CharacterNode>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT glyph FROM characters WHERE level = ?1 ORDER BY glyph")?;
        let rows = stmt.query_map(params![level.as_str()], |row| row.get::<_, String>(0))?;

        let mut characters = Vec::new();
        for row in rows {
            characters.push(CharacterNode::new(Self::parse_glyph(&row?)?, level));
        }
        Ok(characters)
    }

    async fn forms_for_character(&self, glyph: char) -> StorageResult<Vec<FormsEdge>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT word, position FROM forms WHERE glyph = ?1 ORDER BY word")?;
        let rows = stmt.query_map(params![glyph.to_string()], |row| {
            Ok(FormsEdge::new(glyph, row.get::<_, String>(0)?, row.get(1)?))
        })?;

        let mut edges = Vec::new();
        for row in rows {
            edges.push(row?);
        }
        Ok(edges)
    }

    async fn forms_for_word(&self, text: &str) -> StorageResult<Vec<FormsEdge>> {
        let conn = self.lock()?;
        Self::query_forms_for_word(&conn, text)
    }

    async fn validate_compound(
        &self,
        glyph: char,
        word: &str,
        position: u32,
    ) -> StorageResult<Option<WordNode>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT w.text, w.reading, w.meaning, w.length
                 FROM forms f JOIN words w ON w.text = f.word
                 WHERE f.glyph = ?1 AND f.word = ?2 AND f.position = ?3",
                params![glyph.to_string(), word, position],
                |row| {
                    Ok(WordNode {
                        text: row.get(0)?,
                        reading: row.get(1)?,
                        meaning: row.get(2)?,
                        length: row.get::<_, i64>(3)? as usize,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    async fn stats(&self) -> StorageResult<GraphStats> {
        let conn = self.lock()?;
        let count = |table: &str| -> StorageResult<usize> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
            Ok(n as usize)
        };

        Ok(GraphStats {
            characters: count("characters")?,
            words: count("words")?,
            forms: count("forms")?,
        })
    }

    async fn compounds_for_character(&self, glyph: char) -> StorageResult<Vec<CompoundEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT w.text, w.reading, w.meaning, w.length, f.position
             FROM forms f JOIN words w ON w.text = f.word
             WHERE f.glyph = ?1
             ORDER BY w.text",
        )?;
        let rows = stmt.query_map(params![glyph.to_string()], |row| {
            Ok((
                WordNode {
                    text: row.get(0)?,
                    reading: row.get(1)?,
                    meaning: row.get(2)?,
                    length: row.get::<_, i64>(3)? as usize,
                },
                row.get::<_, u32>(4)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (word, position) = row?;
            let forms = Self::query_forms_for_word(&conn, &word.text)?;
            entries.push(assemble_entry(glyph, position, word, &forms));
        }
        Ok(entries)
    }
}
