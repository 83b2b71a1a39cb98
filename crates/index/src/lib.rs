//! Backend-agnostic basket index for the pantry catalog.
//!
//! This crate provides:
//! - The `IndexBackend` contract: one row per basket keyed by UUID
//! - Backends: in-memory tabular and SQLite relational
//! - Full-scan `sync` reconciliation against a storage root
//! - The `LineageGraph` derived view over parent UUIDs

pub mod backend;
pub mod error;
pub mod lineage;
pub mod memory;
pub mod models;
pub mod sqlite;
pub mod sync;

pub use backend::{BasketQuery, IndexBackend};
pub use error::{IndexError, IndexResult};
pub use lineage::LineageGraph;
pub use memory::MemoryBackend;
pub use models::BasketRow;
pub use sqlite::SqliteBackend;
pub use sync::{sync_index, SyncReport};

use pantry_core::config::IndexConfig;
use std::sync::Arc;

/// Create an index backend from configuration.
pub async fn from_config(config: &IndexConfig) -> IndexResult<Arc<dyn IndexBackend>> {
    config.validate().map_err(IndexError::Config)?;

    match config {
        IndexConfig::Memory => Ok(Arc::new(MemoryBackend::new())),
        IndexConfig::Sqlite { path } => {
            let backend = SqliteBackend::new(path).await?;
            Ok(Arc::new(backend))
        }
    }
}
