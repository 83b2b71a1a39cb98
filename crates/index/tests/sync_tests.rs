// Reconciliation tests: discovery, idempotent re-index, invalid-basket
// skipping, and conservative stale-row flagging.

use bytes::Bytes;
use pantry_core::{Manifest, MANIFEST_FILE};
use pantry_index::{sync_index, BasketRow, IndexBackend, MemoryBackend};
use pantry_storage::{FilesystemBackend, ObjectStore};
use tempfile::TempDir;
use uuid::Uuid;

const ROOT: &str = "pantry";

async fn store(dir: &TempDir) -> FilesystemBackend {
    FilesystemBackend::new(dir.path()).await.unwrap()
}

async fn seed_basket(store: &FilesystemBackend, basket_type: &str) -> Manifest {
    let manifest = Manifest::new(Uuid::new_v4(), vec![], basket_type, None);
    let address = format!("{ROOT}/{}/{}", basket_type, manifest.uuid);
    store
        .put(
            &format!("{address}/{MANIFEST_FILE}"),
            Bytes::from(manifest.to_json().unwrap()),
        )
        .await
        .unwrap();
    store
        .put(&format!("{address}/data.bin"), Bytes::from_static(b"payload"))
        .await
        .unwrap();
    manifest
}

#[tokio::test]
async fn test_sync_discovers_baskets() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir).await;
    let index = MemoryBackend::new();

    let a = seed_basket(&store, "telemetry").await;
    let b = seed_basket(&store, "images").await;

    let report = sync_index(&index, &store, ROOT).await.unwrap();

    assert_eq!(report.upserted.len(), 2);
    assert!(report.invalid.is_empty());
    assert!(report.stale.is_empty());
    assert!(index.get(a.uuid).await.unwrap().is_some());
    assert!(index.get(b.uuid).await.unwrap().is_some());

    let row = index.get(a.uuid).await.unwrap().unwrap();
    assert_eq!(row.address, format!("{ROOT}/telemetry/{}", a.uuid));
    assert_eq!(row.storage_type, "filesystem");
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir).await;
    let index = MemoryBackend::new();

    seed_basket(&store, "telemetry").await;
    seed_basket(&store, "telemetry").await;

    sync_index(&index, &store, ROOT).await.unwrap();
    let mut first: Vec<_> = index.all().await.unwrap();
    first.sort_by_key(|r| r.uuid);

    sync_index(&index, &store, ROOT).await.unwrap();
    let mut second: Vec<_> = index.all().await.unwrap();
    second.sort_by_key(|r| r.uuid);

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_sync_skips_invalid_manifests() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir).await;
    let index = MemoryBackend::new();

    let good = seed_basket(&store, "telemetry").await;
    let bad_address = format!("{ROOT}/telemetry/{}", Uuid::new_v4());
    store
        .put(
            &format!("{bad_address}/{MANIFEST_FILE}"),
            Bytes::from_static(b"not json"),
        )
        .await
        .unwrap();

    let report = sync_index(&index, &store, ROOT).await.unwrap();

    assert_eq!(report.upserted, vec![good.uuid]);
    assert_eq!(report.invalid, vec![bad_address]);
    assert_eq!(index.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_sync_ignores_staged_trees() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir).await;
    let index = MemoryBackend::new();

    let staged = Manifest::new(Uuid::new_v4(), vec![], "telemetry", None);
    store
        .put(
            &format!("{ROOT}/.staging/{}/{MANIFEST_FILE}", staged.uuid),
            Bytes::from(staged.to_json().unwrap()),
        )
        .await
        .unwrap();

    let report = sync_index(&index, &store, ROOT).await.unwrap();
    assert!(report.upserted.is_empty());
    assert_eq!(index.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_sync_flags_stale_rows_without_deleting() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir).await;
    let index = MemoryBackend::new();

    // A row for a basket that storage no longer holds.
    let ghost = Manifest::new(Uuid::new_v4(), vec![], "telemetry", None);
    let ghost_row = BasketRow::from_manifest(
        &ghost,
        format!("{ROOT}/telemetry/{}", ghost.uuid),
        "filesystem",
    );
    index.upsert(&ghost_row).await.unwrap();

    let live = seed_basket(&store, "telemetry").await;

    let report = sync_index(&index, &store, ROOT).await.unwrap();

    assert_eq!(report.stale.len(), 1);
    assert_eq!(report.stale[0].uuid, ghost.uuid);
    // Conservative reporting: the stale row is flagged, never deleted.
    assert!(index.get(ghost.uuid).await.unwrap().is_some());
    assert!(index.get(live.uuid).await.unwrap().is_some());
}
