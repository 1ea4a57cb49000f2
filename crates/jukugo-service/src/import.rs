//! Level import pipeline
//!
//! One run reads the whole dictionary, keeps the forms the classifier admits
//! for the requested level and writes them with a single ingest
//! transaction. Setup (`GraphStore::initialize`) is its own idempotent step
//! before that.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use jukugo_core::{Classifier, CompoundWord, Level, RejectionStats};
use jukugo_dict::{DictionaryReader, ParseStats};
use jukugo_storage::{GraphStore, IngestBatch, IngestOutcome};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use ulid::Ulid;

use crate::error::{ServiceError, ServiceResult};
use crate::levels::LevelSource;

/// Unique identifier for an import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportRunId(pub Ulid);

impl ImportRunId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ImportRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ImportRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What to import
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub level: Level,
    pub dictionary: PathBuf,
}

impl ImportRequest {
    pub fn new(level: Level, dictionary: impl Into<PathBuf>) -> Self {
        Self {
            level,
            dictionary: dictionary.into(),
        }
    }
}

/// Outcome of a successful import
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub run_id: ImportRunId,
    pub level: Level,
    /// Characters assigned to the level and merged
    pub characters: usize,
    /// Compound words the classifier produced, one per admitted form
    pub compounds: usize,
    pub written: IngestOutcome,
    pub parse: ParseStats,
    pub rejections: RejectionStats,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Output of the parse + classify stage
#[derive(Debug, Default)]
struct Classified {
    compounds: Vec<CompoundWord>,
    parse: ParseStats,
    rejections: RejectionStats,
}

/// Runs level imports against a graph store.
///
/// Imports of the same level are serialized; different levels may run
/// concurrently and rely on the store's own write locking.
pub struct Importer<S: GraphStore + ?Sized> {
    store: Arc<S>,
    /// One lock per level, indexed by rank
    locks: [Mutex<()>; Level::ALL.len()],
}

impl<S: GraphStore + ?Sized> Importer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: std::array::from_fn(|_| Mutex::new(())),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Import every admissible compound for `request.level`
    pub async fn import_level(
        &self,
        request: ImportRequest,
        levels: &dyn LevelSource,
        cancel: CancellationToken,
    ) -> ServiceResult<ImportReport> {
        let level = request.level;
        let _guard = self.locks[level.rank()].lock().await;

        let run_id = ImportRunId::new();
        let started_at = Utc::now();
        let timer = Instant::now();
        tracing::info!(%run_id, %level, dictionary = %request.dictionary.display(), "Starting import");

        let character_levels = levels.character_levels().await?;
        let current = levels.characters_at(level).await?;

        // Open failures surface before anything is written
        let reader = DictionaryReader::open(&request.dictionary)?;

        self.store.initialize().await?;

        let classifier = Classifier::new(level, character_levels, current.iter().copied());
        let parse_cancel = cancel.clone();
        let classified =
            tokio::task::spawn_blocking(move || classify_entries(reader, &classifier, &parse_cancel))
                .await??;

        let batch = IngestBatch {
            level,
            characters: &current,
            compounds: &classified.compounds,
        };
        let written = self.store.ingest(&batch, &cancel).await?;

        let finished_at = Utc::now();
        let report = ImportReport {
            run_id,
            level,
            characters: current.len(),
            compounds: classified.compounds.len(),
            written,
            parse: classified.parse,
            rejections: classified.rejections,
            started_at,
            finished_at,
            duration_ms: timer.elapsed().as_millis() as u64,
        };

        tracing::info!(
            %run_id,
            %level,
            characters = report.characters,
            compounds = report.compounds,
            edges_skipped = report.written.edges_skipped,
            rejected = report.rejections.total(),
            duration_ms = report.duration_ms,
            "Import complete"
        );

        Ok(report)
    }
}

/// Scan the dictionary and classify every written form.
///
/// Runs on a blocking thread. Cancellation is checked before each entry.
fn classify_entries<R: BufRead>(
    mut reader: DictionaryReader<R>,
    classifier: &Classifier,
    cancel: &CancellationToken,
) -> ServiceResult<Classified> {
    let mut out = Classified::default();

    loop {
        if cancel.is_cancelled() {
            tracing::info!(entries = reader.stats().entries, "Import cancelled during parse");
            return Err(ServiceError::Cancelled);
        }

        let Some(entry) = reader.next() else {
            break;
        };
        let entry = entry?;

        for form in &entry.written_forms {
            match classifier.compound(form, entry.first_reading(), entry.first_meaning()) {
                Ok(compound) => out.compounds.push(compound),
                Err(rejection) => {
                    tracing::trace!(word = %form, %rejection, "Rejected");
                    out.rejections.record(&rejection);
                }
            }
        }
    }

    out.parse = reader.stats();
    tracing::debug!(
        entries = out.parse.entries,
        compounds = out.compounds.len(),
        rejected = out.rejections.total(),
        "Dictionary scan finished"
    );
    Ok(out)
}
