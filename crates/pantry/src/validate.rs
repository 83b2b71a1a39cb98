//! Whole-pantry validation: cross-checks storage against the basket schema
//! and the index, aggregating findings instead of failing fast.

use crate::error::PantryResult;
use futures::StreamExt;
use pantry_core::basket::{artifact_key, is_artifact_key, STAGING_PREFIX};
use pantry_core::{ContentHash, Manifest, Supplement, MANIFEST_FILE, METADATA_FILE, SUPPLEMENT_FILE};
use pantry_index::IndexBackend;
use pantry_storage::ObjectStore;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// How deeply file content is checked during validation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegrityMode {
    /// Trust recorded hashes; check that artifacts parse and that the
    /// supplement's file set matches storage.
    #[default]
    Trust,
    /// Additionally recompute the hash of every copied file. Expensive.
    Full,
}

/// A non-fatal validation finding. One corrupt basket never blocks
/// visibility into the rest of the pantry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Warning {
    MissingManifest {
        address: String,
    },
    InvalidManifest {
        address: String,
        reason: String,
    },
    MissingSupplement {
        address: String,
    },
    InvalidSupplement {
        address: String,
        reason: String,
    },
    InvalidMetadata {
        address: String,
        reason: String,
    },
    SupplementFileMissing {
        address: String,
        path: String,
    },
    FileNotInSupplement {
        address: String,
        path: String,
    },
    HashMismatch {
        address: String,
        path: String,
    },
    DuplicateUuid {
        uuid: Uuid,
        first_address: String,
        second_address: String,
    },
    StaleIndexEntry {
        uuid: Uuid,
        address: String,
    },
    OrphanedParent {
        uuid: Uuid,
        missing_parent: Uuid,
    },
    /// A basket committed to storage but whose index registration failed.
    Unindexed {
        uuid: Uuid,
        address: String,
        reason: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MissingManifest { address } => {
                write!(f, "Invalid basket. Manifest does not exist at {address}")
            }
            Warning::InvalidManifest { address, reason } => {
                write!(f, "Invalid basket. Manifest could not be loaded at {address}: {reason}")
            }
            Warning::MissingSupplement { address } => {
                write!(f, "Invalid basket. Supplement does not exist at {address}")
            }
            Warning::InvalidSupplement { address, reason } => {
                write!(f, "Invalid basket. Supplement could not be loaded at {address}: {reason}")
            }
            Warning::InvalidMetadata { address, reason } => {
                write!(f, "Invalid basket. Metadata could not be loaded at {address}: {reason}")
            }
            Warning::SupplementFileMissing { path, .. } => {
                write!(f, "File listed in the supplement does not exist in storage: {path}")
            }
            Warning::FileNotInSupplement { path, .. } => {
                write!(f, "File found in storage is not listed in the supplement: {path}")
            }
            Warning::HashMismatch { path, .. } => {
                write!(f, "File content does not match its recorded hash: {path}")
            }
            Warning::DuplicateUuid {
                uuid,
                first_address,
                second_address,
            } => write!(
                f,
                "Duplicate basket uuid {uuid} found at {first_address} and {second_address}"
            ),
            Warning::StaleIndexEntry { uuid, address } => {
                write!(f, "Index entry has no basket in storage: {uuid} at {address}")
            }
            Warning::OrphanedParent {
                uuid,
                missing_parent,
            } => write!(
                f,
                "Parent uuid {missing_parent} of basket {uuid} was not found in the index"
            ),
            Warning::Unindexed {
                uuid,
                address,
                reason,
            } => write!(
                f,
                "Committed basket was not indexed: {uuid} at {address}: {reason}"
            ),
        }
    }
}

/// Walks storage and cross-checks every discovered basket against its
/// artifacts and against the index.
pub struct PantryValidator {
    store: Arc<dyn ObjectStore>,
    index: Arc<dyn IndexBackend>,
    root: String,
}

impl PantryValidator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        index: Arc<dyn IndexBackend>,
        root: impl Into<String>,
    ) -> Self {
        Self {
            store,
            index,
            root: root.into(),
        }
    }

    /// Validate the whole pantry, returning all findings.
    ///
    /// Only a failure to reach storage or the index is an error; per-basket
    /// problems become warnings.
    #[instrument(skip(self))]
    pub async fn validate(&self, mode: IntegrityMode) -> PantryResult<Vec<Warning>> {
        let root_prefix = format!("{}/", self.root.trim_end_matches('/'));

        // Group keys by address at the basket_type/uuid depth.
        let mut baskets: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for key in self.store.list(&self.root).await? {
            let Some(rel) = key.strip_prefix(&root_prefix) else {
                continue;
            };
            let parts: Vec<&str> = rel.split('/').collect();
            if parts.len() < 3 || parts[0] == STAGING_PREFIX {
                continue;
            }
            let address = format!("{root_prefix}{}/{}", parts[0], parts[1]);
            baskets.entry(address).or_default().push(key);
        }

        let mut warnings = Vec::new();
        let mut seen_uuids: HashMap<Uuid, String> = HashMap::new();

        for (address, keys) in &baskets {
            self.check_basket(address, keys, mode, &mut seen_uuids, &mut warnings)
                .await?;
        }

        // Index rows pointing at addresses with no files at all. Rows whose
        // address holds an invalid basket are already reported above.
        for row in self.index.all().await? {
            if row.address.starts_with(&root_prefix) && !baskets.contains_key(&row.address) {
                warnings.push(Warning::StaleIndexEntry {
                    uuid: row.uuid,
                    address: row.address,
                });
            }
        }

        Ok(warnings)
    }

    async fn check_basket(
        &self,
        address: &str,
        keys: &[String],
        mode: IntegrityMode,
        seen_uuids: &mut HashMap<Uuid, String>,
        warnings: &mut Vec<Warning>,
    ) -> PantryResult<()> {
        let manifest_key = artifact_key(address, MANIFEST_FILE);
        if !keys.contains(&manifest_key) {
            warnings.push(Warning::MissingManifest {
                address: address.to_string(),
            });
            return Ok(());
        }

        match self.load_manifest(&manifest_key).await {
            Ok(manifest) => {
                if let Some(first_address) =
                    seen_uuids.insert(manifest.uuid, address.to_string())
                {
                    warnings.push(Warning::DuplicateUuid {
                        uuid: manifest.uuid,
                        first_address,
                        second_address: address.to_string(),
                    });
                }
                for parent in &manifest.parent_uuids {
                    if self.index.get(*parent).await?.is_none() {
                        warnings.push(Warning::OrphanedParent {
                            uuid: manifest.uuid,
                            missing_parent: *parent,
                        });
                    }
                }
            }
            Err(reason) => warnings.push(Warning::InvalidManifest {
                address: address.to_string(),
                reason,
            }),
        }

        let supplement_key = artifact_key(address, SUPPLEMENT_FILE);
        if !keys.contains(&supplement_key) {
            warnings.push(Warning::MissingSupplement {
                address: address.to_string(),
            });
        } else {
            match self.load_supplement(&supplement_key).await {
                Ok(supplement) => {
                    self.check_supplement_files(address, keys, &supplement, mode, warnings)
                        .await?;
                }
                Err(reason) => warnings.push(Warning::InvalidSupplement {
                    address: address.to_string(),
                    reason,
                }),
            }
        }

        let metadata_key = artifact_key(address, METADATA_FILE);
        if keys.contains(&metadata_key) {
            let bytes = self.store.get(&metadata_key).await?;
            if let Err(e) = serde_json::from_slice::<serde_json::Value>(&bytes) {
                warnings.push(Warning::InvalidMetadata {
                    address: address.to_string(),
                    reason: e.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Cross-check the supplement's ledger against the files actually
    /// present, in both directions.
    async fn check_supplement_files(
        &self,
        address: &str,
        keys: &[String],
        supplement: &Supplement,
        mode: IntegrityMode,
        warnings: &mut Vec<Warning>,
    ) -> PantryResult<()> {
        let data_keys: HashSet<&str> = keys
            .iter()
            .filter(|k| !is_artifact_key(k))
            .map(String::as_str)
            .collect();
        let declared: HashSet<&str> = supplement.copied_paths().collect();

        for path in declared.difference(&data_keys) {
            warnings.push(Warning::SupplementFileMissing {
                address: address.to_string(),
                path: (*path).to_string(),
            });
        }
        for path in data_keys.difference(&declared) {
            warnings.push(Warning::FileNotInSupplement {
                address: address.to_string(),
                path: (*path).to_string(),
            });
        }

        if mode == IntegrityMode::Full {
            for entry in supplement.upload_items.iter().filter(|e| e.is_copied()) {
                if !data_keys.contains(entry.upload_path.as_str()) {
                    continue;
                }
                let computed = self.hash_object(&entry.upload_path).await?;
                if computed != entry.hash {
                    warnings.push(Warning::HashMismatch {
                        address: address.to_string(),
                        path: entry.upload_path.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    async fn hash_object(&self, key: &str) -> PantryResult<ContentHash> {
        let mut stream = self.store.get_stream(key).await?;
        let mut hasher = ContentHash::hasher();
        while let Some(chunk) = stream.next().await {
            hasher.update(&chunk?);
        }
        Ok(hasher.finalize())
    }

    async fn load_manifest(&self, key: &str) -> Result<Manifest, String> {
        let bytes = self.store.get(key).await.map_err(|e| e.to_string())?;
        Manifest::from_json(&bytes).map_err(|e| e.to_string())
    }

    async fn load_supplement(&self, key: &str) -> Result<Supplement, String> {
        let bytes = self.store.get(key).await.map_err(|e| e.to_string())?;
        Supplement::from_json(&bytes).map_err(|e| e.to_string())
    }
}
