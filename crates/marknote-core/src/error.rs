//! Error types for marknote.

use thiserror::Error;

/// Result type alias using marknote's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for marknote operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed or missing input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Caller does not own the target, or the target does not exist.
    /// The two cases are never distinguished.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Entity absent for the given owner
    #[error("Not found: {0}")]
    NotFound(String),

    /// Username or email already registered
    #[error("Duplicate identity: {0}")]
    DuplicateIdentity(String),

    /// Sibling folder with the same name already exists
    #[error("Duplicate folder: {0}")]
    DuplicateFolder(String),

    /// Note with the same title already exists in the folder
    #[error("Duplicate note: {0}")]
    DuplicateNote(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
