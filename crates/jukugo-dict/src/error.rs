//! Dictionary reader error types

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Result type alias for dictionary reading
pub type DictResult<T> = std::result::Result<T, DictError>;

/// Errors that end a dictionary scan.
///
/// Local malformations never surface here; they are skipped and counted in
/// [`ParseStats`](crate::ParseStats).
#[derive(Error, Debug)]
pub enum DictError {
    #[error("Failed to open dictionary {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error while reading dictionary: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Dictionary is malformed beyond recovery at byte {position}: {message}")]
    Malformed { position: u64, message: String },
}
