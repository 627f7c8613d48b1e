//! Object storage seam for the remote backend.

mod memory;
#[cfg(feature = "s3")]
mod s3;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

pub use memory::MemoryObjectStorage;
#[cfg(feature = "s3")]
pub use s3::{S3ObjectStorage, S3StorageConfig};

/// Minimal object storage operations the remote backend needs.
///
/// An uploaded object either exists in full or not at all; no partial
/// object is ever visible.
///
/// # Implementations
///
/// - [`MemoryObjectStorage`]: in-process map, for tests and dry runs
/// - `S3ObjectStorage`: AWS S3 or a compatible service (feature `s3`)
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Upload the file at `path` as one object.
    async fn put_file(&self, key: &str, path: &Path) -> Result<()>;

    /// Exactly `length` bytes starting at `offset`.
    ///
    /// `None` when the object is missing or shorter than the range.
    async fn get_range(&self, key: &str, offset: u64, length: u64) -> Result<Option<Vec<u8>>>;

    /// Keys of every object starting with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}
