//! Jukugo Storage - Graph storage backends
//!
//! This crate provides the backends that hold Character and Word nodes and
//! the FORMS edges between them. Every write goes through merge-by-key
//! semantics so repeated imports converge to the same graph.

#![allow(clippy::result_large_err)]

pub mod error;
pub mod migration;
pub mod traits;

#[cfg(feature = "redb")]
pub mod redb;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub mod memory;

pub use error::{StorageError, StorageResult};
pub use migration::{Migratable, SchemaVersion, CURRENT_VERSION};
pub use traits::{GraphStore, IngestBatch, IngestOutcome};

#[cfg(feature = "redb")]
pub use redb::RedbStorage;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStorage;

pub use memory::MemoryStorage;
