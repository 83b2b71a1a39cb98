//! Upload item model and basket address derivation.

use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Manifest artifact filename.
pub const MANIFEST_FILE: &str = "basket_manifest.json";
/// Supplement artifact filename.
pub const SUPPLEMENT_FILE: &str = "basket_supplement.json";
/// Metadata artifact filename.
pub const METADATA_FILE: &str = "basket_metadata.json";

/// Filenames reserved for basket artifacts; user data may not use them.
pub const RESERVED_FILENAMES: [&str; 3] = [MANIFEST_FILE, SUPPLEMENT_FILE, METADATA_FILE];

/// Hidden key prefix for staged, not-yet-committed baskets.
pub const STAGING_PREFIX: &str = ".staging";

/// A single item requested for upload into a basket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadItem {
    /// Local file or directory to upload.
    pub source_path: PathBuf,
    /// When true, only integrity data is recorded; bytes are not copied.
    pub is_stub: bool,
}

impl UploadItem {
    /// An item whose bytes are copied into the basket.
    pub fn file(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            is_stub: false,
        }
    }

    /// An item recorded by reference only.
    pub fn stub(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            is_stub: true,
        }
    }

    /// Validate the item before any storage I/O.
    ///
    /// Non-stub sources must exist; the item's filename must not collide
    /// with a reserved artifact name.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.is_stub && !self.source_path.exists() {
            return Err(crate::Error::InvalidUploadItem(format!(
                "source_path does not exist: {}",
                self.source_path.display()
            )));
        }
        if let Some(name) = self.source_path.file_name().and_then(|n| n.to_str()) {
            if RESERVED_FILENAMES.contains(&name) {
                return Err(crate::Error::InvalidUploadItem(format!(
                    "filename is reserved for basket artifacts: {name}"
                )));
            }
        }
        Ok(())
    }
}

/// Derive the storage address of a basket: `<root>/<basket_type>/<uuid>`.
///
/// Addresses use forward-slash keys on the object store regardless of
/// platform. Once committed, a basket's address never changes.
pub fn basket_address(root: &str, basket_type: &str, uuid: &Uuid) -> String {
    format!("{}/{}/{}", root.trim_end_matches('/'), basket_type, uuid)
}

/// Key of a named artifact inside a basket address.
pub fn artifact_key(address: &str, artifact: &str) -> String {
    format!("{address}/{artifact}")
}

/// Whether a key names one of the three basket artifacts.
pub fn is_artifact_key(key: &str) -> bool {
    key.rsplit('/')
        .next()
        .map(|name| RESERVED_FILENAMES.contains(&name))
        .unwrap_or(false)
}

/// Relative destination of a source file within a basket.
///
/// Single files land at the basket root under their filename; files from a
/// directory item keep their position relative to the directory's parent, so
/// the directory name itself is preserved in the basket.
pub fn relative_upload_path(item_root: &Path, file_path: &Path) -> Option<String> {
    let base = item_root.parent().unwrap_or(item_root);
    let rel = file_path.strip_prefix(base).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
