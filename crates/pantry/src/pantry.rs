//! The pantry orchestrator: upload, retrieval, deletion, lineage, and
//! validation over one storage root and its index.

use crate::error::{PantryError, PantryResult};
use crate::reader::{Basket, BasketReader};
use crate::validate::{IntegrityMode, PantryValidator, Warning};
use crate::writer::{BasketWriter, UploadRequest};
use pantry_index::{sync_index, BasketRow, IndexBackend, LineageGraph, SyncReport};
use pantry_storage::ObjectStore;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Result of a successful upload: the indexed row, plus a warning when the
/// basket committed but could not be registered with the index.
#[derive(Clone, Debug)]
pub struct UploadReceipt {
    pub row: BasketRow,
    pub warning: Option<Warning>,
}

/// A storage root plus its index backend, constituting one managed data
/// store.
///
/// Holds no mutable state beyond the injected storage and index handles;
/// dropping the pantry leaves the underlying storage untouched.
pub struct Pantry {
    store: Arc<dyn ObjectStore>,
    index: Arc<dyn IndexBackend>,
    root: String,
    writer: BasketWriter,
    reader: BasketReader,
    lineage: LineageGraph,
}

impl Pantry {
    /// Create a pantry over an existing (possibly non-empty) storage root.
    ///
    /// The index may start empty; `sync` populates it from a full scan.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        index: Arc<dyn IndexBackend>,
        root: impl Into<String>,
    ) -> Self {
        let root = root.into();
        Self {
            writer: BasketWriter::new(store.clone(), root.clone()),
            reader: BasketReader::new(store.clone()),
            lineage: LineageGraph::new(index.clone()),
            store,
            index,
            root,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn index(&self) -> &Arc<dyn IndexBackend> {
        &self.index
    }

    /// Commit a new basket and register it with the index.
    ///
    /// If registration fails after a successful commit, the basket stays
    /// valid in storage and the failure is surfaced as a warning rather
    /// than a rollback: undoing the commit could destroy valid data, and a
    /// later `sync` will pick the basket up.
    pub async fn upload(&self, request: UploadRequest) -> PantryResult<UploadReceipt> {
        let committed = self.writer.upload(&request).await?;
        let row = BasketRow::from_manifest(
            &committed.manifest,
            &committed.address,
            self.store.backend_name(),
        );

        let warning = match self.index.upsert(&row).await {
            Ok(()) => None,
            Err(e) => {
                warn!(uuid = %row.uuid, address = %row.address, error = %e,
                      "committed basket could not be indexed");
                Some(Warning::Unindexed {
                    uuid: row.uuid,
                    address: row.address.clone(),
                    reason: e.to_string(),
                })
            }
        };

        Ok(UploadReceipt { row, warning })
    }

    /// Load the basket view for a UUID known to the index.
    pub async fn get_basket(&self, uuid: Uuid) -> PantryResult<Basket> {
        let row = self
            .index
            .get(uuid)
            .await?
            .ok_or_else(|| PantryError::NotFound(uuid.to_string()))?;
        self.reader.load(&row.address).await
    }

    /// List a basket's data files, excluding artifacts.
    pub async fn ls(&self, uuid: Uuid) -> PantryResult<Vec<String>> {
        let row = self
            .index
            .get(uuid)
            .await?
            .ok_or_else(|| PantryError::NotFound(uuid.to_string()))?;
        self.reader.ls(&row.address).await
    }

    /// Delete a basket's storage tree, then its index row.
    ///
    /// Storage goes first: deleting the row first and then failing the
    /// storage delete would orphan data with no index trace. If the index
    /// delete fails afterwards the stale row is reported as a warning and
    /// later caught by validation. Baskets that other baskets list as a
    /// parent are deleted without blocking; dangling parent references are
    /// tolerated.
    pub async fn delete_basket(&self, uuid: Uuid) -> PantryResult<Option<Warning>> {
        let row = self
            .index
            .get(uuid)
            .await?
            .ok_or_else(|| PantryError::NotFound(uuid.to_string()))?;

        self.store.delete_prefix(&row.address).await?;

        match self.index.delete(uuid).await {
            Ok(()) => Ok(None),
            Err(e) => {
                warn!(uuid = %uuid, address = %row.address, error = %e,
                      "storage deleted but index row remains");
                Ok(Some(Warning::StaleIndexEntry {
                    uuid,
                    address: row.address,
                }))
            }
        }
    }

    /// Rows of the basket's parents; deleted parents are omitted.
    pub async fn parents(&self, uuid: Uuid) -> PantryResult<Vec<BasketRow>> {
        Ok(self.lineage.parents(uuid).await?)
    }

    /// Rows of every basket listing `uuid` among its parents.
    pub async fn children(&self, uuid: Uuid) -> PantryResult<Vec<BasketRow>> {
        Ok(self.lineage.children(uuid).await?)
    }

    /// Reconcile the index against a full storage scan.
    pub async fn sync(&self) -> PantryResult<SyncReport> {
        Ok(sync_index(self.index.as_ref(), self.store.as_ref(), &self.root).await?)
    }

    /// Validate the whole pantry, returning all findings.
    pub async fn validate(&self, mode: IntegrityMode) -> PantryResult<Vec<Warning>> {
        let validator =
            PantryValidator::new(self.store.clone(), self.index.clone(), self.root.clone());
        validator.validate(mode).await
    }
}
