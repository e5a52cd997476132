//! Error types for the record store.
//!
//! Storage-layer failures are converted into these variants at the store
//! boundary; nothing below it reaches the dispatcher as a raw fault.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::input_validator::ValidationError;

/// Unified error type for record store and diary operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record or account absent.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Backing file exists but does not hold a JSON array of records.
    #[error("Corrupt collection {path:?}: {reason}")]
    CorruptDocument { path: PathBuf, reason: String },

    /// Uniqueness violation on a keyed field.
    #[error("Duplicate {field}: {value}")]
    DuplicateKey { field: &'static str, value: String },

    /// Missing or malformed input.
    #[error("Validation failed: {0}")]
    ValidationFailure(String),

    /// I/O failure other than absence while loading a collection.
    #[error("Failed to read {path:?}: {source}")]
    StorageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while persisting a collection.
    #[error("Failed to write {path:?}: {source}")]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Password hashing primitive failed.
    #[error("Credential hashing failed: {0}")]
    Hashing(String),
}

impl StoreError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationFailure(msg.into())
    }

    pub fn duplicate(field: &'static str, value: impl Into<String>) -> Self {
        Self::DuplicateKey {
            field,
            value: value.into(),
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationFailure(err.to_string())
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
