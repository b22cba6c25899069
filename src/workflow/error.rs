//! Workflow error taxonomy

use thiserror::Error;

/// Errors surfaced by workflow operations.
///
/// The first four variants carry the domain taxonomy (malformed input,
/// actor lacks role/ownership, transition illegal from current status,
/// referenced entity absent); `Database` wraps store failures and is never
/// exposed verbatim to callers.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Invalid state transition: {0}")]
    StateConflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type alias for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;
