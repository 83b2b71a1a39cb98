//! Basket creation: staging, integrity ledger, and atomic commit.

use crate::error::{PantryError, PantryResult};
use bytes::Bytes;
use pantry_core::basket::{
    artifact_key, basket_address, relative_upload_path, STAGING_PREFIX,
};
use pantry_core::{
    ContentHash, IntegrityComputer, Manifest, Supplement, SupplementEntry, UploadItem,
    MANIFEST_FILE, METADATA_FILE, READ_CHUNK_SIZE, SUPPLEMENT_FILE,
};
use pantry_storage::{ObjectStore, StreamingUpload};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::io::AsyncReadExt;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Everything needed to create one basket.
#[derive(Clone, Debug, Default)]
pub struct UploadRequest {
    pub upload_items: Vec<UploadItem>,
    pub basket_type: String,
    pub parent_uuids: Vec<Uuid>,
    /// Opaque user document; must be a JSON object when present.
    pub metadata: Option<serde_json::Value>,
    pub label: Option<String>,
}

impl UploadRequest {
    pub fn new(upload_items: Vec<UploadItem>, basket_type: impl Into<String>) -> Self {
        Self {
            upload_items,
            basket_type: basket_type.into(),
            ..Self::default()
        }
    }

    fn has_metadata(&self) -> bool {
        matches!(&self.metadata, Some(value) if value.as_object().is_some_and(|m| !m.is_empty()))
    }

    /// Validate the request before any storage I/O.
    fn validate(&self) -> PantryResult<()> {
        if self.basket_type.is_empty() {
            return Err(PantryError::InvalidUpload(
                "basket_type must be non-empty".to_string(),
            ));
        }
        if self.basket_type.contains('/')
            || self.basket_type.contains('\\')
            || self.basket_type.starts_with('.')
        {
            return Err(PantryError::InvalidUpload(format!(
                "basket_type is not a valid address component: {}",
                self.basket_type
            )));
        }
        if let Some(metadata) = &self.metadata {
            if !metadata.is_object() {
                return Err(PantryError::InvalidUpload(
                    "metadata must be a JSON object".to_string(),
                ));
            }
        }
        if self.upload_items.is_empty() {
            // A basket must carry either files or metadata-with-lineage.
            if !self.has_metadata() || self.parent_uuids.is_empty() {
                return Err(PantryError::InvalidUpload(
                    "empty upload_items requires non-empty metadata and parent_uuids".to_string(),
                ));
            }
        }
        for item in &self.upload_items {
            item.validate()?;
        }
        Ok(())
    }
}

/// Descriptor of a committed basket, returned to the caller for indexing.
#[derive(Clone, Debug)]
pub struct CommittedBasket {
    pub uuid: Uuid,
    pub address: String,
    pub manifest: Manifest,
    pub supplement: Supplement,
}

/// Stages upload items into a hidden prefix, computes the manifest and
/// supplement, then atomically promotes the staged tree to its final address.
///
/// On any failure the staging area is deleted; a reader observing the final
/// address sees either nothing or a manifest-complete basket.
pub struct BasketWriter {
    store: Arc<dyn ObjectStore>,
    root: String,
}

impl BasketWriter {
    pub fn new(store: Arc<dyn ObjectStore>, root: impl Into<String>) -> Self {
        Self {
            store,
            root: root.into(),
        }
    }

    /// Run the commit protocol for one basket.
    #[instrument(skip(self, request), fields(basket_type = %request.basket_type))]
    pub async fn upload(&self, request: &UploadRequest) -> PantryResult<CommittedBasket> {
        request.validate()?;

        let uuid = Uuid::new_v4();
        let address = basket_address(&self.root, &request.basket_type, &uuid);

        // Freshly generated UUIDs collide with astronomically low
        // probability, but an occupied address must still abort the upload
        // before any I/O side effects.
        if !self.store.list(&address).await?.is_empty() {
            return Err(PantryError::Collision(address));
        }

        let staging = format!("{}/{}/{}", self.root, STAGING_PREFIX, uuid);

        match self.stage_and_promote(request, uuid, &staging, &address).await {
            Ok((manifest, supplement)) => Ok(CommittedBasket {
                uuid,
                address,
                manifest,
                supplement,
            }),
            Err(e) => {
                if let Err(cleanup) = self.store.delete_prefix(&staging).await {
                    warn!(staging = %staging, error = %cleanup, "failed to clean staging area");
                }
                Err(PantryError::UploadFailed {
                    source: Box::new(e),
                })
            }
        }
    }

    async fn stage_and_promote(
        &self,
        request: &UploadRequest,
        uuid: Uuid,
        staging: &str,
        address: &str,
    ) -> PantryResult<(Manifest, Supplement)> {
        let supplement = self.stage_items(&request.upload_items, staging, address).await?;

        self.store
            .put(
                &artifact_key(staging, SUPPLEMENT_FILE),
                Bytes::from(supplement.to_json()?),
            )
            .await?;

        if let Some(metadata) = request.metadata.as_ref().filter(|_| request.has_metadata()) {
            let json = serde_json::to_string(metadata)
                .map_err(|e| pantry_core::Error::Serialization(e.to_string()))?;
            self.store
                .put(&artifact_key(staging, METADATA_FILE), Bytes::from(json))
                .await?;
        }

        // The manifest is the visibility gate, so it is staged strictly last.
        let manifest = Manifest::new(
            uuid,
            request.parent_uuids.clone(),
            request.basket_type.clone(),
            request.label.clone(),
        );
        manifest.validate()?;
        self.store
            .put(
                &artifact_key(staging, MANIFEST_FILE),
                Bytes::from(manifest.to_json()?),
            )
            .await?;

        self.store.rename_prefix(staging, address).await?;
        Ok((manifest, supplement))
    }

    /// Copy or reference every file of every item, recording integrity data.
    async fn stage_items(
        &self,
        items: &[UploadItem],
        staging: &str,
        address: &str,
    ) -> PantryResult<Supplement> {
        let mut supplement = Supplement::default();

        for item in items {
            let files = collect_files(&item.source_path).await?;
            for file in files {
                if let Some(name) = file.file_name().and_then(|n| n.to_str()) {
                    if pantry_core::basket::RESERVED_FILENAMES.contains(&name) {
                        return Err(PantryError::InvalidUpload(format!(
                            "filename is reserved for basket artifacts: {name}"
                        )));
                    }
                }
                let upload_item_path = file.to_string_lossy().into_owned();
                let access_date = OffsetDateTime::now_utc();

                if item.is_stub {
                    let (hash, file_size) = IntegrityComputer::compute_file(&file).await?;
                    supplement.upload_items.push(SupplementEntry {
                        upload_item_path,
                        upload_path: pantry_core::supplement::STUB_UPLOAD_PATH.to_string(),
                        file_size,
                        hash,
                        access_date,
                        is_stub: true,
                    });
                } else {
                    let rel = relative_upload_path(&item.source_path, &file).ok_or_else(|| {
                        PantryError::InvalidUpload(format!(
                            "cannot derive upload path for {}",
                            file.display()
                        ))
                    })?;
                    let staged_key = format!("{staging}/{rel}");
                    let (hash, file_size) = self.copy_and_hash(&file, &staged_key).await?;
                    supplement.upload_items.push(SupplementEntry {
                        upload_item_path,
                        // The ledger records the final, post-promotion key.
                        upload_path: format!("{address}/{rel}"),
                        file_size,
                        hash,
                        access_date,
                        is_stub: false,
                    });
                }
            }
        }

        Ok(supplement)
    }

    /// Stream a local file into storage, hashing concurrently with the copy.
    async fn copy_and_hash(&self, path: &Path, key: &str) -> PantryResult<(ContentHash, u64)> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut upload = self.store.put_stream(key).await?;
        let mut hasher = ContentHash::hasher();
        let mut total: u64 = 0;
        let mut buf = vec![0u8; READ_CHUNK_SIZE];

        loop {
            let n = match file.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    upload.abort().await?;
                    return Err(e.into());
                }
            };
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            upload.write(Bytes::copy_from_slice(&buf[..n])).await?;
            total += n as u64;
        }

        upload.finish().await?;
        Ok((hasher.finalize(), total))
    }
}

/// Collect the regular files of an upload item, walking directories
/// recursively. Symlinks are skipped. Order is deterministic so the
/// supplement ledger is stable across runs.
async fn collect_files(source: &Path) -> PantryResult<Vec<PathBuf>> {
    let metadata = tokio::fs::symlink_metadata(source).await?;
    if metadata.is_file() {
        return Ok(vec![source.to_path_buf()]);
    }

    let mut files = Vec::new();
    let mut stack = vec![source.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                stack.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_files_walks_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), b"b").unwrap();

        let files = collect_files(dir.path()).await.unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0] < files[1]);
    }

    #[test]
    fn test_request_validation_rules() {
        // Empty basket_type.
        let request = UploadRequest::new(vec![], "");
        assert!(matches!(
            request.validate(),
            Err(PantryError::InvalidUpload(_))
        ));

        // Path-escaping basket_type.
        let request = UploadRequest::new(vec![], "a/b");
        assert!(request.validate().is_err());

        // Empty items with neither metadata nor lineage.
        let request = UploadRequest::new(vec![], "item");
        assert!(request.validate().is_err());

        // Empty items with empty metadata object still rejected.
        let request = UploadRequest {
            metadata: Some(serde_json::json!({})),
            parent_uuids: vec![Uuid::new_v4()],
            ..UploadRequest::new(vec![], "item")
        };
        assert!(request.validate().is_err());

        // Metadata-only basket with lineage is accepted.
        let request = UploadRequest {
            metadata: Some(serde_json::json!({"k": "v"})),
            parent_uuids: vec![Uuid::new_v4()],
            ..UploadRequest::new(vec![], "item")
        };
        assert!(request.validate().is_ok());

        // Non-object metadata rejected.
        let request = UploadRequest {
            metadata: Some(serde_json::json!([1, 2])),
            parent_uuids: vec![Uuid::new_v4()],
            ..UploadRequest::new(vec![], "item")
        };
        assert!(request.validate().is_err());
    }
}
