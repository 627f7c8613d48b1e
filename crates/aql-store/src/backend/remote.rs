use std::path::{Path, PathBuf};
use std::sync::Arc;

use aql_fs::{StageOptions, StagedFile};
use tracing::debug;

use super::ContainerBackend;
use crate::core::{container_file_name, is_valid_key, key_from_file_name};
use crate::error::{Error, Result};
use crate::storage::ObjectStorage;

/// Containers as `{prefix}{key}.warc.gz` objects.
///
/// A container is assembled in a local scratch file and uploaded in one
/// call on commit, so the object is either complete or absent.
#[derive(Clone)]
pub struct RemoteBackend {
    storage: Arc<dyn ObjectStorage>,
    prefix:  String,
    scratch: PathBuf,
    staging: StageOptions,
}

impl std::fmt::Debug for RemoteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteBackend")
            .field("prefix", &self.prefix)
            .field("scratch", &self.scratch)
            .field("storage", &"{ ... }")
            .finish()
    }
}

impl RemoteBackend {
    pub fn new(storage: Arc<dyn ObjectStorage>, prefix: impl Into<String>, scratch: impl Into<PathBuf>) -> Result<Self> {
        let scratch = scratch.into();
        std::fs::create_dir_all(&scratch)?;
        Ok(Self {
            storage,
            prefix: prefix.into(),
            scratch,
            staging: StageOptions::new(),
        })
    }

    pub fn prefix(&self) -> &str { &self.prefix }

    pub fn scratch(&self) -> &Path { &self.scratch }

    pub fn object_key(&self, key: &str) -> String { format!("{}{}", self.prefix, container_file_name(key)) }
}

impl ContainerBackend for RemoteBackend {
    async fn exists(&self, key: &str) -> Result<bool> {
        let staging = self.scratch.join(self.staging.staging_name(&container_file_name(key)));
        Ok(tokio::fs::try_exists(staging).await? || self.storage.exists(&self.object_key(key)).await?)
    }

    fn stage(&self, key: &str, sync: bool) -> Result<StagedFile> {
        Ok(StagedFile::create(
            &self.scratch,
            &container_file_name(key),
            self.staging.sync(sync),
        )?)
    }

    async fn commit(&self, key: &str, mut staged: StagedFile) -> Result<()> {
        staged.finish()?;
        let object_key = self.object_key(key);
        self.storage.put_file(&object_key, staged.staging_path()).await?;
        debug!(container = %key, object = %object_key, bytes = staged.len(), "uploaded container");
        // The scratch copy is removed when `staged` drops uncommitted.
        Ok(())
    }

    async fn read_range(&self, key: &str, offset: u64, length: u64) -> Result<Vec<u8>> {
        let not_found = || Error::LocationNotFound {
            key: key.to_string(),
            offset,
            length,
        };
        if !is_valid_key(key) {
            return Err(not_found());
        }
        self.storage
            .get_range(&self.object_key(key), offset, length)
            .await?
            .ok_or_else(not_found)
    }

    async fn containers(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .storage
            .list(&self.prefix)
            .await?
            .iter()
            .filter_map(|object| object.strip_prefix(self.prefix.as_str()))
            .filter_map(key_from_file_name)
            .map(str::to_string)
            .collect();
        keys.sort();
        Ok(keys)
    }
}
