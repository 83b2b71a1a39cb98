//! Basket supplement schema: the per-file integrity ledger.

use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Destination recorded for items uploaded as stubs (referenced, not copied).
pub const STUB_UPLOAD_PATH: &str = "stub";

/// Integrity record for a single uploaded file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupplementEntry {
    /// Source path the item was read from.
    pub upload_item_path: String,
    /// Destination key in storage, or `"stub"` for stub items.
    pub upload_path: String,
    /// Content size in bytes.
    pub file_size: u64,
    /// SHA-256 digest of the content.
    pub hash: ContentHash,
    /// When the source was read.
    #[serde(with = "time::serde::rfc3339")]
    pub access_date: OffsetDateTime,
    /// Whether the item was recorded by reference only.
    pub is_stub: bool,
}

impl SupplementEntry {
    /// Whether this entry refers to a file present inside the basket.
    pub fn is_copied(&self) -> bool {
        !self.is_stub
    }
}

/// Per-file integrity ledger for a basket.
///
/// Exactly one supplement exists per committed basket, stored as
/// `basket_supplement.json`. A metadata-only basket carries an empty ledger.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Supplement {
    pub upload_items: Vec<SupplementEntry>,
}

impl Supplement {
    /// Serialize to JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(|e| crate::Error::Serialization(e.to_string()))
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &[u8]) -> crate::Result<Self> {
        serde_json::from_slice(json).map_err(|e| crate::Error::Serialization(e.to_string()))
    }

    /// Destination keys of all copied (non-stub) entries.
    pub fn copied_paths(&self) -> impl Iterator<Item = &str> {
        self.upload_items
            .iter()
            .filter(|e| e.is_copied())
            .map(|e| e.upload_path.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry(is_stub: bool) -> SupplementEntry {
        SupplementEntry {
            upload_item_path: "/data/run.csv".to_string(),
            upload_path: if is_stub {
                STUB_UPLOAD_PATH.to_string()
            } else {
                "pantry/telemetry/abc/run.csv".to_string()
            },
            file_size: 1024,
            hash: ContentHash::compute(b"run data"),
            access_date: OffsetDateTime::now_utc(),
            is_stub,
        }
    }

    #[test]
    fn test_supplement_json_roundtrip() {
        let supplement = Supplement {
            upload_items: vec![sample_entry(false), sample_entry(true)],
        };
        let json = supplement.to_json().unwrap();
        let back = Supplement::from_json(json.as_bytes()).unwrap();
        assert_eq!(back, supplement);
    }

    #[test]
    fn test_copied_paths_skips_stubs() {
        let supplement = Supplement {
            upload_items: vec![sample_entry(false), sample_entry(true)],
        };
        let copied: Vec<_> = supplement.copied_paths().collect();
        assert_eq!(copied, vec!["pantry/telemetry/abc/run.csv"]);
    }

    #[test]
    fn test_empty_supplement_parses() {
        let supplement = Supplement::from_json(br#"{"upload_items":[]}"#).unwrap();
        assert!(supplement.upload_items.is_empty());
    }
}
