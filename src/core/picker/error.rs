//! Error types for the response picker.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::input_validator::ValidationError;

/// Failures raised while loading a category document or selecting from it.
///
/// Every variant is loud: a missing document is reported, never collapsed
/// into an empty response.
#[derive(Debug, Error)]
pub enum PickerError {
    /// Document missing, document without categories, or category key absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document is not a JSON object of string lists.
    #[error("Corrupt category document {path:?}: {source}")]
    CorruptDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Category present but holds no templates.
    #[error("Category '{0}' has no responses")]
    EmptyCategory(String),

    /// Document name rejected before touching the filesystem.
    #[error("Invalid document name: {0}")]
    InvalidName(#[from] ValidationError),

    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PickerError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

/// Result type alias for picker operations.
pub type PickerResult<T> = Result<T, PickerError>;
