//! Error types for buildsync-daemon

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use buildsync::{SchedulerError, StorageError, SyncError};
use serde::Serialize;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Scheduling service client error
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Sync pass error
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a triggered pass did not produce an outcome
#[derive(Debug, Error)]
pub enum TriggerError {
    /// Another pass holds the in-flight slot
    #[error("A sync pass is already running")]
    Busy,

    /// The pass itself failed
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Sync pass error
    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),
}

impl From<TriggerError> for ApiError {
    fn from(err: TriggerError) -> Self {
        match err {
            TriggerError::Busy => ApiError::Conflict(TriggerError::Busy.to_string()),
            TriggerError::Sync(e) => ApiError::Sync(e),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "SYNC_IN_PROGRESS"),
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Sync(SyncError::MissingAccessToken) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "MISSING_ACCESS_TOKEN")
            }
            ApiError::Sync(SyncError::Repository(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "REPOSITORY_ERROR")
            }
            ApiError::Sync(SyncError::Storage(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            ApiError::NotFound("curl".to_string()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(TriggerError::Busy).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(TriggerError::Sync(SyncError::MissingAccessToken))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
