//! Service error types

use jukugo_core::limits::ValidationError;
use jukugo_dict::DictError;
use jukugo_storage::StorageError;
use thiserror::Error;

/// Result type alias for service operations
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Dictionary error: {0}")]
    Dictionary(#[from] DictError),

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error(transparent)]
    Core(#[from] jukugo_core::Error),

    #[error("Level source error: {0}")]
    Levels(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Import cancelled")]
    Cancelled,

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Cancelled => ServiceError::Cancelled,
            other => ServiceError::Storage(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(e: ValidationError) -> Self {
        ServiceError::InvalidInput(e.to_string())
    }
}
