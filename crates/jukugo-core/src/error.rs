//! Error types for Jukugo Core

use thiserror::Error;

/// Result type alias using Jukugo's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Jukugo error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid level: {0} (expected one of N5, N4, N3, N2, N1)")]
    InvalidLevel(String),
}
