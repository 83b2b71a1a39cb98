// Concurrent upload tests: disjoint staging areas and addresses mean
// parallel uploads never interfere.

mod common;

use common::{test_pantry, write_source_file};
use pantry::{IntegrityMode, UploadRequest};
use pantry_core::UploadItem;
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test]
async fn test_concurrent_disjoint_uploads_all_succeed() {
    let t = test_pantry().await;
    let pantry = Arc::new(t.pantry);

    let mut sources = Vec::new();
    for i in 0..8 {
        sources.push(write_source_file(
            t.dir.path(),
            &format!("data_{i}.bin"),
            format!("payload {i}").as_bytes(),
        ));
    }

    let mut handles = Vec::new();
    for source in sources {
        let pantry = pantry.clone();
        handles.push(tokio::spawn(async move {
            pantry
                .upload(UploadRequest::new(
                    vec![UploadItem::file(&source)],
                    "telemetry",
                ))
                .await
                .unwrap()
        }));
    }

    let mut uuids = HashSet::new();
    for handle in handles {
        let receipt = handle.await.unwrap();
        assert!(receipt.warning.is_none());
        uuids.insert(receipt.row.uuid);
    }
    assert_eq!(uuids.len(), 8);

    // Every basket is independently visible and loadable.
    assert_eq!(pantry.index().count().await.unwrap(), 8);
    for uuid in &uuids {
        let basket = pantry.get_basket(*uuid).await.unwrap();
        assert_eq!(basket.supplement().upload_items.len(), 1);
    }

    // No cross-contamination of staged or committed files.
    let warnings = pantry.validate(IntegrityMode::Full).await.unwrap();
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
}

#[tokio::test]
async fn test_concurrent_uploads_with_shared_parent() {
    let t = test_pantry().await;
    let pantry = Arc::new(t.pantry);
    let source = write_source_file(t.dir.path(), "seed.bin", b"seed");

    let parent = pantry
        .upload(UploadRequest::new(vec![UploadItem::file(&source)], "item"))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let pantry = pantry.clone();
        let source = source.clone();
        let parent_uuid = parent.row.uuid;
        handles.push(tokio::spawn(async move {
            pantry
                .upload(UploadRequest {
                    parent_uuids: vec![parent_uuid],
                    ..UploadRequest::new(vec![UploadItem::file(&source)], "item")
                })
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let children = pantry.children(parent.row.uuid).await.unwrap();
    assert_eq!(children.len(), 4);
}
