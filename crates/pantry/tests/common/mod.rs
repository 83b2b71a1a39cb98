#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use pantry::Pantry;
use pantry_index::MemoryBackend;
use pantry_storage::{
    ByteStream, FilesystemBackend, ObjectStore, StorageError, StorageResult, StreamingUpload,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Pantry root key prefix used by all integration tests.
pub const ROOT: &str = "pantry";

/// A pantry over a temp-dir filesystem backend and an in-memory index.
pub struct TestPantry {
    pub dir: TempDir,
    pub store: Arc<FilesystemBackend>,
    pub index: Arc<MemoryBackend>,
    pub pantry: Pantry,
}

pub async fn test_pantry() -> TestPantry {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FilesystemBackend::new(dir.path().join("store")).await.unwrap());
    let index = Arc::new(MemoryBackend::new());
    let pantry = Pantry::new(store.clone(), index.clone(), ROOT);
    TestPantry {
        dir,
        store,
        index,
        pantry,
    }
}

/// Write a small source tree and return the paths of its files.
pub fn write_source_tree(base: &Path) -> (PathBuf, PathBuf) {
    let tree = base.join("results");
    std::fs::create_dir_all(tree.join("day1")).unwrap();
    let file_a = tree.join("summary.csv");
    let file_b = tree.join("day1/run.csv");
    std::fs::write(&file_a, b"total,3\n").unwrap();
    std::fs::write(&file_b, b"sample,1\nsample,2\n").unwrap();
    (tree, file_a)
}

/// Write a single source file with the given content.
pub fn write_source_file(base: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = base.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Delegating store that fails `put` for keys ending in a configured
/// suffix, simulating a storage fault mid-commit.
pub struct FailingStore {
    inner: Arc<FilesystemBackend>,
    fail_suffix: String,
}

impl FailingStore {
    pub fn new(inner: Arc<FilesystemBackend>, fail_suffix: impl Into<String>) -> Self {
        Self {
            inner,
            fail_suffix: fail_suffix.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for FailingStore {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        self.inner.get(key).await
    }

    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream> {
        self.inner.get_stream(key).await
    }

    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        if key.ends_with(&self.fail_suffix) {
            return Err(StorageError::Io(std::io::Error::other(
                "injected storage fault",
            )));
        }
        self.inner.put(key, data).await
    }

    async fn put_stream(&self, key: &str) -> StorageResult<Box<dyn StreamingUpload>> {
        self.inner.put_stream(key).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.inner.delete(key).await
    }

    async fn delete_prefix(&self, prefix: &str) -> StorageResult<()> {
        self.inner.delete_prefix(prefix).await
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.inner.list(prefix).await
    }

    async fn rename_prefix(&self, from: &str, to: &str) -> StorageResult<()> {
        self.inner.rename_prefix(from, to).await
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}
