//! In-memory tabular index backend.

use crate::backend::{BasketQuery, IndexBackend};
use crate::error::IndexResult;
use crate::models::BasketRow;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Tabular index backend held entirely in process memory.
///
/// Safe for concurrent use within one process; the table lock is never held
/// across an await point. Contents are lost when the process exits, so a
/// fresh instance is typically populated with `sync_index`.
#[derive(Default)]
pub struct MemoryBackend {
    rows: RwLock<HashMap<Uuid, BasketRow>>,
}

impl MemoryBackend {
    /// Create an empty in-memory index.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_poisoned() -> crate::IndexError {
        crate::IndexError::Internal("index table lock poisoned".to_string())
    }
}

#[async_trait]
impl IndexBackend for MemoryBackend {
    async fn upsert(&self, row: &BasketRow) -> IndexResult<()> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        rows.insert(row.uuid, row.clone());
        Ok(())
    }

    async fn get(&self, uuid: Uuid) -> IndexResult<Option<BasketRow>> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows.get(&uuid).cloned())
    }

    async fn query(&self, query: &BasketQuery) -> IndexResult<Vec<BasketRow>> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        let mut matched: Vec<BasketRow> = rows
            .values()
            .filter(|row| query.matches(row))
            .cloned()
            .collect();
        if query.sort_by_upload_time {
            matched.sort_by_key(|row| row.upload_time);
        }
        Ok(matched)
    }

    async fn delete(&self, uuid: Uuid) -> IndexResult<()> {
        let mut rows = self.rows.write().map_err(|_| Self::lock_poisoned())?;
        rows.remove(&uuid);
        Ok(())
    }

    async fn all(&self) -> IndexResult<Vec<BasketRow>> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows.values().cloned().collect())
    }

    async fn count(&self) -> IndexResult<u64> {
        let rows = self.rows.read().map_err(|_| Self::lock_poisoned())?;
        Ok(rows.len() as u64)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
