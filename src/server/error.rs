//! HTTP error mapping.
//!
//! Every core error reaching a handler is converted into an [`ApiError`],
//! which renders as `{"error": {"code", "message"}}` with a matching status.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::core::picker::PickerError;
use crate::core::store::StoreError;

/// Errors raised while starting or running the dispatcher.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Server already running")]
    AlreadyRunning,

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to initialise diary storage: {0}")]
    Storage(#[from] StoreError),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// A request failure with its HTTP status and machine-readable code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }
}

impl From<PickerError> for ApiError {
    fn from(err: PickerError) -> Self {
        match &err {
            PickerError::NotFound(_) => Self::not_found(err.to_string()),
            PickerError::InvalidName(_) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_name", err.to_string())
            }
            PickerError::EmptyCategory(_) => {
                log::error!("Response picker: {}", err);
                Self::internal("empty_category", err.to_string())
            }
            PickerError::CorruptDocument { .. } => {
                log::error!("Response picker: {}", err);
                Self::internal("corrupt_document", "response document is malformed")
            }
            PickerError::Io { .. } => {
                log::error!("Response picker: {}", err);
                Self::internal("io_error", "failed to read response document")
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::NotFound(_) => Self::not_found(err.to_string()),
            StoreError::DuplicateKey { .. } => {
                Self::new(StatusCode::CONFLICT, "duplicate", err.to_string())
            }
            StoreError::ValidationFailure(msg) => Self::bad_request(msg.clone()),
            StoreError::CorruptDocument { .. } => {
                log::error!("Record store: {}", err);
                Self::internal("corrupt_document", "stored data is unreadable")
            }
            StoreError::StorageRead { .. } => {
                log::error!("Record store: {}", err);
                Self::internal("storage_read", "failed to read stored data")
            }
            StoreError::StorageWrite { .. } => {
                log::error!("Record store: {}", err);
                Self::internal("storage_write", "failed to save changes")
            }
            StoreError::Serialization(_) | StoreError::Hashing(_) => {
                log::error!("Record store: {}", err);
                Self::internal("internal_error", "internal error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => Self::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "unsupported_media_type",
                rejection.body_text(),
            ),
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                Self::bad_request(rejection.body_text())
            }
            _ => Self::new(rejection.status(), "invalid_request", rejection.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({
                "error": {
                    "code": self.code,
                    "message": self.message,
                }
            })),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
