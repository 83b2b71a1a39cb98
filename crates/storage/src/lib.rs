//! Object storage abstraction and backends for the pantry basket catalog.
//!
//! This crate provides:
//! - The `ObjectStore` capability set consumed by the basket writer, the
//!   index scan, and the validator
//! - Atomic per-object writes and atomic prefix promotion
//! - Backend: local filesystem (S3-compatible stores plug in through the
//!   same trait from outside this repository)

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::filesystem::FilesystemBackend;
pub use error::{StorageError, StorageResult};
pub use traits::{ByteStream, ObjectStore, StreamingUpload};

use pantry_core::config::StorageConfig;
use std::sync::Arc;

/// Create an object store from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    config.validate().map_err(StorageError::Config)?;

    match config {
        StorageConfig::Filesystem { path } => {
            let backend = FilesystemBackend::new(path).await?;
            Ok(Arc::new(backend))
        }
    }
}
