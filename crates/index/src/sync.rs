//! Full-scan reconciliation of an index against a storage root.

use crate::backend::IndexBackend;
use crate::error::IndexResult;
use crate::models::BasketRow;
use pantry_core::basket::STAGING_PREFIX;
use pantry_core::{Manifest, MANIFEST_FILE};
use pantry_storage::ObjectStore;
use std::collections::HashSet;
use tracing::warn;
use uuid::Uuid;

/// Outcome of one `sync_index` pass.
///
/// Stale rows are flagged for the caller to handle explicitly; sync never
/// deletes index rows on its own.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// UUIDs of baskets discovered in storage and upserted.
    pub upserted: Vec<Uuid>,
    /// Addresses whose manifest was unreadable or malformed; skipped.
    pub invalid: Vec<String>,
    /// Index rows under the scanned root with no valid basket in storage.
    pub stale: Vec<BasketRow>,
}

/// Scan `root` for baskets and reconcile `index` against what storage holds.
///
/// Every address carrying a parseable manifest is upserted (idempotent, so
/// two passes over unchanged storage yield identical rows). Per-basket
/// failures are collected into the report rather than aborting the scan.
pub async fn sync_index(
    index: &dyn IndexBackend,
    store: &dyn ObjectStore,
    root: &str,
) -> IndexResult<SyncReport> {
    let manifest_suffix = format!("/{MANIFEST_FILE}");
    let mut report = SyncReport::default();
    let mut discovered: HashSet<String> = HashSet::new();

    for key in store.list(root).await? {
        if !key.ends_with(&manifest_suffix) {
            continue;
        }
        // Staged trees are invisible to readers until promoted.
        if key.split('/').any(|part| part == STAGING_PREFIX) {
            continue;
        }
        let address = key[..key.len() - manifest_suffix.len()].to_string();

        let manifest = match store.get(&key).await {
            Ok(bytes) => match Manifest::from_json(&bytes) {
                Ok(manifest) => manifest,
                Err(e) => {
                    warn!(address = %address, error = %e, "skipping invalid manifest");
                    report.invalid.push(address);
                    continue;
                }
            },
            Err(e) => {
                warn!(address = %address, error = %e, "skipping unreadable manifest");
                report.invalid.push(address);
                continue;
            }
        };

        let row = BasketRow::from_manifest(&manifest, &address, store.backend_name());
        index.upsert(&row).await?;
        report.upserted.push(row.uuid);
        discovered.insert(address);
    }

    let root_prefix = format!("{}/", root.trim_end_matches('/'));
    for row in index.all().await? {
        if row.address.starts_with(&root_prefix) && !discovered.contains(&row.address) {
            report.stale.push(row);
        }
    }

    Ok(report)
}
