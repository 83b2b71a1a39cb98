//! Read-only access to committed baskets.

use crate::error::{PantryError, PantryResult};
use pantry_core::basket::{artifact_key, is_artifact_key};
use pantry_core::{Manifest, Supplement, MANIFEST_FILE, METADATA_FILE, SUPPLEMENT_FILE};
use pantry_storage::{ObjectStore, StorageError};
use std::sync::Arc;
use uuid::Uuid;

/// A validated, read-only view of one committed basket.
#[derive(Clone, Debug)]
pub struct Basket {
    address: String,
    manifest: Manifest,
    supplement: Supplement,
    metadata: Option<serde_json::Value>,
}

impl Basket {
    pub fn uuid(&self) -> Uuid {
        self.manifest.uuid
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn supplement(&self) -> &Supplement {
        &self.supplement
    }

    pub fn metadata(&self) -> Option<&serde_json::Value> {
        self.metadata.as_ref()
    }
}

/// Loads and validates basket artifacts. Read operations never mutate
/// storage.
pub struct BasketReader {
    store: Arc<dyn ObjectStore>,
}

impl BasketReader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Load the three artifacts at `address` into a basket view.
    ///
    /// A missing or malformed manifest or supplement makes the basket
    /// invalid; metadata is optional but must parse when present.
    pub async fn load(&self, address: &str) -> PantryResult<Basket> {
        let manifest_key = artifact_key(address, MANIFEST_FILE);
        let manifest_bytes = self.get_required(&manifest_key).await?;
        let manifest = Manifest::from_json(&manifest_bytes)
            .map_err(|e| invalid(&manifest_key, e.to_string()))?;

        let supplement_key = artifact_key(address, SUPPLEMENT_FILE);
        let supplement_bytes = self.get_required(&supplement_key).await?;
        let supplement = Supplement::from_json(&supplement_bytes)
            .map_err(|e| invalid(&supplement_key, e.to_string()))?;

        let metadata_key = artifact_key(address, METADATA_FILE);
        let metadata = match self.store.get(&metadata_key).await {
            Ok(bytes) => Some(
                serde_json::from_slice(&bytes)
                    .map_err(|e| invalid(&metadata_key, e.to_string()))?,
            ),
            Err(StorageError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Basket {
            address: address.to_string(),
            manifest,
            supplement,
            metadata,
        })
    }

    /// List data keys under `address`, excluding the three artifact files.
    pub async fn ls(&self, address: &str) -> PantryResult<Vec<String>> {
        let keys = self.store.list(address).await?;
        Ok(keys.into_iter().filter(|k| !is_artifact_key(k)).collect())
    }

    async fn get_required(&self, key: &str) -> PantryResult<bytes::Bytes> {
        match self.store.get(key).await {
            Ok(bytes) => Ok(bytes),
            Err(StorageError::NotFound(_)) => Err(invalid(key, "does not exist".to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

fn invalid(path: &str, reason: String) -> PantryError {
    PantryError::InvalidBasket {
        path: path.to_string(),
        reason,
    }
}
