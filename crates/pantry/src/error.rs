//! Pantry error types.

use thiserror::Error;

/// Pantry operation errors.
#[derive(Debug, Error)]
pub enum PantryError {
    #[error("storage error: {0}")]
    Storage(#[from] pantry_storage::StorageError),

    #[error("index error: {0}")]
    Index(#[from] pantry_index::IndexError),

    #[error(transparent)]
    Core(#[from] pantry_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid basket at {path}: {reason}")]
    InvalidBasket { path: String, reason: String },

    #[error("basket address already occupied: {0}")]
    Collision(String),

    #[error("basket not found: {0}")]
    NotFound(String),

    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    /// Any failure during staging or promotion. The staging area has been
    /// cleaned up; no partial basket is visible at the final address.
    #[error("upload failed: {source}")]
    UploadFailed {
        #[source]
        source: Box<PantryError>,
    },
}

/// Result type for pantry operations.
pub type PantryResult<T> = std::result::Result<T, PantryError>;
