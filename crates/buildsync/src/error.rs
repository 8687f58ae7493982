//! Error types for buildsync

use thiserror::Error;

/// Invalid builds-per-day value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Value is an integer outside the accepted range
    #[error("builds per day must be in range [1-{max}], got {value}")]
    OutOfRange { value: i64, max: u8 },

    /// Integer too large to represent as `i64`
    #[error("builds per day must be in range [1-{max}], got {value}")]
    TooLarge { value: String, max: u8 },

    /// Value is not an integer at all
    #[error("builds per day is not an integer: {0}")]
    NotAnInteger(String),
}

/// Error in a project's `project.yaml`
#[derive(Debug, Error)]
pub enum ProjectYamlError {
    #[error("invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("top level is not a mapping")]
    NotAMapping,

    #[error("invalid schedule parameter: {0}")]
    Schedule(#[from] ScheduleError),
}

/// Repository browsing errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Path does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Path exists but has the wrong kind (file vs directory)
    #[error("Unexpected entry kind at {path}: expected {expected}")]
    UnexpectedKind { path: String, expected: &'static str },

    /// Remote API answered with an error status
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Remote API returned only part of a directory listing
    #[error("Listing of {0} is truncated")]
    Truncated(String),

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Content could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Access token cannot be sent as an HTTP header
    #[error("Access token is not a valid header value")]
    InvalidAccessToken,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Scheduling service errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Job does not exist
    #[error("Job not found: {0}")]
    NotFound(String),

    /// Job with the same identifier already exists
    #[error("Job already exists: {0}")]
    AlreadyExists(String),

    /// Service answered with an error status
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failure reported by a non-HTTP backend
    #[error("Service call failed: {0}")]
    Call(String),

    /// Client cannot be built from its configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Storage-specific errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Invalid data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query error
    #[error("Query error: {0}")]
    Query(String),
}

/// Errors that terminate a sync pass
#[derive(Debug, Error)]
pub enum SyncError {
    /// No access token stored for the repository client
    #[error("No access token available")]
    MissingAccessToken,

    /// Repository could not be read
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Record store could not be read
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
pub type SchedulerResult<T> = Result<T, SchedulerError>;
pub type StorageResult<T> = Result<T, StorageError>;
pub type SyncResult<T> = Result<T, SyncError>;
