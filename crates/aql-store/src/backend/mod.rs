//! Container backends: where staged containers are written and committed.

mod local;
mod remote;

use std::future::Future;

use aql_fs::StagedFile;

use crate::error::Result;

pub use local::LocalBackend;
pub use remote::RemoteBackend;

/// Storage for finalized containers.
///
/// A container is assembled in a [`StagedFile`] and handed back to
/// [`commit`](Self::commit) once complete; before that no reader can see it.
pub trait ContainerBackend: Send + Sync {
    /// Whether `key` is taken by a finalized or an in-progress container.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Open a staging file for container `key`.
    fn stage(&self, key: &str, sync: bool) -> Result<StagedFile>;

    /// Make the staged container readable under `key`.
    fn commit(&self, key: &str, staged: StagedFile) -> impl Future<Output = Result<()>> + Send;

    /// Raw bytes of one member of a finalized container.
    fn read_range(&self, key: &str, offset: u64, length: u64) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Keys of all finalized containers, sorted.
    fn containers(&self) -> impl Future<Output = Result<Vec<String>>> + Send;
}
