use std::path::{Path, PathBuf};

use aql_fs::{StageOptions, StagedFile};
use tracing::debug;

use super::ContainerBackend;
use crate::core::{container_file_name, is_valid_key, key_from_file_name};
use crate::error::{Error, Result};

/// Containers as `{key}.warc.gz` files in one directory.
///
/// In-progress containers live next to them as `.{key}.warc.gz.tmp` and are
/// renamed into place on commit.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root:    PathBuf,
    staging: StageOptions,
}

impl LocalBackend {
    /// Use `root`, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            staging: StageOptions::new(),
        })
    }

    pub fn root(&self) -> &Path { &self.root }

    pub fn container_path(&self, key: &str) -> PathBuf { self.root.join(container_file_name(key)) }
}

impl ContainerBackend for LocalBackend {
    async fn exists(&self, key: &str) -> Result<bool> {
        let name = container_file_name(key);
        let staging = self.root.join(self.staging.staging_name(&name));
        Ok(tokio::fs::try_exists(self.root.join(&name)).await? || tokio::fs::try_exists(staging).await?)
    }

    fn stage(&self, key: &str, sync: bool) -> Result<StagedFile> {
        Ok(StagedFile::create(
            &self.root,
            &container_file_name(key),
            self.staging.sync(sync),
        )?)
    }

    async fn commit(&self, key: &str, staged: StagedFile) -> Result<()> {
        let path = staged.commit()?;
        debug!(container = %key, path = %path.display(), "renamed container into place");
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
        match aql_fs::read_range(self.container_path(key), offset, length) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.is_not_found() => Err(not_found()),
            Err(e) => Err(e.into()),
        }
    }

    async fn containers(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if let Some(key) = name.to_str().and_then(key_from_file_name) {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
