//! Storage trait definitions.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// Object store abstraction for basket storage.
///
/// Keys are forward-slash-separated paths relative to the backend root.
/// The capability set is intentionally small: read, write, list, delete,
/// and atomic-rename-or-equivalent, which is everything the basket commit
/// protocol and the index scan require.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Check if an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Get an object's content.
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Get an object as a byte stream.
    async fn get_stream(&self, key: &str) -> StorageResult<ByteStream>;

    /// Put an object atomically.
    async fn put(&self, key: &str, data: Bytes) -> StorageResult<()>;

    /// Start a streaming upload.
    async fn put_stream(&self, key: &str) -> StorageResult<Box<dyn StreamingUpload>>;

    /// Delete an object.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Delete every object under a prefix. Deleting an absent prefix is not
    /// an error, so failed-upload cleanup is idempotent.
    async fn delete_prefix(&self, prefix: &str) -> StorageResult<()>;

    /// List object keys under a prefix.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Move every object under `from` to the same relative key under `to`.
    ///
    /// This is the commit protocol's promotion step. Backends with a native
    /// atomic rename must perform the move as one operation; backends
    /// without one must move the manifest artifact strictly last, so a
    /// reader observing `to` sees either nothing or a manifest-complete
    /// basket. Fails with `AlreadyExists` if `to` is occupied.
    async fn rename_prefix(&self, from: &str, to: &str) -> StorageResult<()>;

    /// Static identifier for the backend type (e.g., "filesystem").
    /// Recorded in index rows and used for logging.
    fn backend_name(&self) -> &'static str;

    /// Verify storage backend connectivity.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Trait for streaming uploads.
#[async_trait]
pub trait StreamingUpload: Send {
    /// Write a chunk of data.
    async fn write(&mut self, data: Bytes) -> StorageResult<()>;

    /// Finish the upload and return the total bytes written.
    async fn finish(self: Box<Self>) -> StorageResult<u64>;

    /// Abort the upload.
    async fn abort(self: Box<Self>) -> StorageResult<()>;
}
