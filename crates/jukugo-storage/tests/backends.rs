//! Behaviour every backend must share

use jukugo_core::{CompoundWord, Level};
use jukugo_storage::{GraphStore, IngestBatch, MemoryStorage};
use tokio_util::sync::CancellationToken;

fn compound(word: &str, reading: &str, meaning: &str, characters: &[char]) -> CompoundWord {
    CompoundWord {
        word: word.to_string(),
        reading: reading.to_string(),
        meaning: meaning.to_string(),
        characters: characters.to_vec(),
    }
}

fn n5_compounds() -> Vec<CompoundWord> {
    vec![
        compound("日本", "にほん", "Japan", &['日', '本']),
        compound("本日", "ほんじつ", "today", &['本', '日']),
        compound("日日", "ひび", "every day", &['日', '日']),
    ]
}

async fn ingest_is_idempotent(store: &dyn GraphStore) {
    store.initialize().await.unwrap();
    let compounds = n5_compounds();
    let batch = IngestBatch {
        level: Level::N5,
        characters: &['日', '本'],
        compounds: &compounds,
    };

    store.ingest(&batch, &CancellationToken::new()).await.unwrap();
    let first = store.stats().await.unwrap();
    store.ingest(&batch, &CancellationToken::new()).await.unwrap();
    let second = store.stats().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.characters, 2);
    assert_eq!(first.words, 3);
    assert_eq!(first.forms, 5);
}

async fn compounds_are_sorted_with_co_characters(store: &dyn GraphStore) {
    store.initialize().await.unwrap();
    let compounds = n5_compounds();
    let batch = IngestBatch {
        level: Level::N5,
        characters: &['日', '本'],
        compounds: &compounds,
    };
    store.ingest(&batch, &CancellationToken::new()).await.unwrap();

    let entries = store.compounds_for_character('本').await.unwrap();
    let words: Vec<&str> = entries.iter().map(|e| e.word.as_str()).collect();
    assert_eq!(words, vec!["日本", "本日"]);

    assert_eq!(entries[0].position, 1);
    assert_eq!(entries[0].co_characters.len(), 1);
    assert_eq!(entries[0].co_characters[0].character, '日');
    assert_eq!(entries[0].co_characters[0].position, 0);

    // A repeated glyph keeps one edge holding its last position
    let entries = store.compounds_for_character('日').await.unwrap();
    let repeated = entries.iter().find(|e| e.word == "日日").unwrap();
    assert_eq!(repeated.position, 1);
    assert!(repeated.co_characters.is_empty());
}

async fn level_is_overwritten_by_later_import(store: &dyn GraphStore) {
    store.initialize().await.unwrap();
    let none: Vec<CompoundWord> = Vec::new();

    let batch = IngestBatch {
        level: Level::N4,
        characters: &['会'],
        compounds: &none,
    };
    store.ingest(&batch, &CancellationToken::new()).await.unwrap();

    let batch = IngestBatch {
        level: Level::N3,
        characters: &['会'],
        compounds: &none,
    };
    store.ingest(&batch, &CancellationToken::new()).await.unwrap();

    let node = store.get_character('会').await.unwrap().unwrap();
    assert_eq!(node.level, Level::N3);
    assert!(store.characters_at_level(Level::N4).await.unwrap().is_empty());
    assert_eq!(store.characters_at_level(Level::N3).await.unwrap().len(), 1);
}

async fn validate_requires_exact_position(store: &dyn GraphStore) {
    store.initialize().await.unwrap();
    let compounds = n5_compounds();
    let batch = IngestBatch {
        level: Level::N5,
        characters: &['日', '本'],
        compounds: &compounds,
    };
    store.ingest(&batch, &CancellationToken::new()).await.unwrap();

    let word = store.validate_compound('日', "日本", 0).await.unwrap().unwrap();
    assert_eq!(word.reading, "にほん");
    assert_eq!(word.length, 2);

    assert!(store.validate_compound('日', "日本", 1).await.unwrap().is_none());
    assert!(store.validate_compound('月', "日本", 0).await.unwrap().is_none());
    assert!(store.validate_compound('日', "月日", 1).await.unwrap().is_none());
}

async fn wipe_empties_graph(store: &dyn GraphStore) {
    store.initialize().await.unwrap();
    let compounds = n5_compounds();
    let batch = IngestBatch {
        level: Level::N5,
        characters: &['日', '本'],
        compounds: &compounds,
    };
    store.ingest(&batch, &CancellationToken::new()).await.unwrap();

    store.wipe().await.unwrap();
    assert!(store.stats().await.unwrap().is_empty());
    assert!(store.compounds_for_character('日').await.unwrap().is_empty());

    // Still usable after a wipe
    store.ingest(&batch, &CancellationToken::new()).await.unwrap();
    assert_eq!(store.stats().await.unwrap().words, 3);
}

async fn run_all(make: impl Fn() -> Box<dyn GraphStore>) {
    ingest_is_idempotent(make().as_ref()).await;
    compounds_are_sorted_with_co_characters(make().as_ref()).await;
    level_is_overwritten_by_later_import(make().as_ref()).await;
    validate_requires_exact_position(make().as_ref()).await;
    wipe_empties_graph(make().as_ref()).await;
}

#[tokio::test]
async fn test_memory_backend() {
    run_all(|| Box::new(MemoryStorage::new())).await;
}

#[cfg(feature = "redb")]
#[tokio::test]
async fn test_redb_backend() {
    use jukugo_storage::RedbStorage;

    let dir = tempfile::tempdir().unwrap();
    let counter = std::sync::atomic::AtomicUsize::new(0);
    run_all(|| {
        let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let path = dir.path().join(format!("graph-{}.redb", n));
        Box::new(RedbStorage::open(path).unwrap())
    })
    .await;
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_sqlite_backend() {
    use jukugo_storage::SqliteStorage;

    run_all(|| Box::new(SqliteStorage::in_memory().unwrap())).await;
}
