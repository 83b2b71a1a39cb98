//! Streaming integrity computation for upload items.

use crate::hash::ContentHash;
use crate::READ_CHUNK_SIZE;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Streams content through a SHA-256 hasher and a byte counter.
///
/// Reads in fixed-size chunks so memory use is bounded regardless of the
/// source size. Identical byte content always yields an identical digest,
/// independent of how the source is chunked.
pub struct IntegrityComputer;

impl IntegrityComputer {
    /// Hash and count everything readable from `reader`.
    pub async fn compute<R>(mut reader: R) -> crate::Result<(ContentHash, u64)>
    where
        R: AsyncRead + Unpin,
    {
        let mut hasher = ContentHash::hasher();
        let mut total: u64 = 0;
        let mut buf = vec![0u8; READ_CHUNK_SIZE];
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
            total += n as u64;
        }
        Ok((hasher.finalize(), total))
    }

    /// Hash and count the content of a local file.
    pub async fn compute_file(path: impl AsRef<Path>) -> crate::Result<(ContentHash, u64)> {
        let file = tokio::fs::File::open(path.as_ref()).await?;
        Self::compute(file).await
    }
}
