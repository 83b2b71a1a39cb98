//! Lineage queries derived from the index's parent-UUID column.

use crate::backend::{BasketQuery, IndexBackend};
use crate::error::{IndexError, IndexResult};
use crate::models::BasketRow;
use std::sync::Arc;
use uuid::Uuid;

/// One-hop ancestor/descendant view over an index backend.
///
/// No separate graph structure is persisted; `parent_uuids` is the only edge
/// data. The graph is a DAG by convention, not by enforced invariant.
#[derive(Clone)]
pub struct LineageGraph {
    index: Arc<dyn IndexBackend>,
}

impl LineageGraph {
    pub fn new(index: Arc<dyn IndexBackend>) -> Self {
        Self { index }
    }

    /// Rows of the basket's parents.
    ///
    /// Parents that have been deleted from the index are omitted, not
    /// errors: dangling references are tolerated and reported only by
    /// validation.
    pub async fn parents(&self, uuid: Uuid) -> IndexResult<Vec<BasketRow>> {
        let row = self
            .index
            .get(uuid)
            .await?
            .ok_or_else(|| IndexError::NotFound(format!("basket {uuid}")))?;

        let mut parents = Vec::with_capacity(row.parent_uuids.len());
        for parent_uuid in row.parent_uuids {
            if let Some(parent) = self.index.get(parent_uuid).await? {
                parents.push(parent);
            }
        }
        Ok(parents)
    }

    /// Rows of every basket listing `uuid` among its parents.
    pub async fn children(&self, uuid: Uuid) -> IndexResult<Vec<BasketRow>> {
        self.index.query(&BasketQuery::with_parent(uuid)).await
    }
}
