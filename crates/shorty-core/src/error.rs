use thiserror::Error;

use crate::backend::SUPPORTED_BACKENDS;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("key already exists: {0}")]
    DuplicateKey(String),
    #[error("stored record is malformed: {0}")]
    Serialization(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("unsupported storage backend '{value}' (supported: {supported})", supported = SUPPORTED_BACKENDS.join(", "))]
    UnsupportedBackend { value: String },
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
}

impl StorageError {
    /// Returns `true` when the error means the short code does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    /// A record with this id is already stored.
    pub fn duplicate_id(id: u64) -> Self {
        StorageError::DuplicateKey(format!("id {id}"))
    }
}
