use aql_store::{LocalBackend, RecordLocation, RecordStore, RemoteBackend};
use aql_warc::WarcRecord;
use anyhow::Result;

use crate::config::{BackendConfig, Config};

/// The configured store, whichever backend it uses.
pub enum AnyStore {
    Local(RecordStore<LocalBackend>),
    Remote(RecordStore<RemoteBackend>),
}

impl AnyStore {
    pub async fn open(config: &Config) -> Result<Self> {
        match &config.backend {
            BackendConfig::Local { path } => Ok(Self::Local(RecordStore::local(path, config.store.clone())?)),
            BackendConfig::S3(s3) => open_s3(config, s3).await,
        }
    }

    pub async fn read(&self, location: &RecordLocation) -> aql_store::Result<WarcRecord> {
        match self {
            Self::Local(store) => store.read(location).await,
            Self::Remote(store) => store.read(location).await,
        }
    }
}

#[cfg(feature = "s3")]
async fn open_s3(config: &Config, s3: &crate::config::S3BackendConfig) -> Result<AnyStore> {
    use std::sync::Arc;

    use aql_store::{S3ObjectStorage, S3StorageConfig};

    let mut storage_config = S3StorageConfig::new(&s3.bucket, &s3.region);
    if let Some(endpoint) = &s3.endpoint_url {
        storage_config = storage_config.with_endpoint_url(endpoint);
    }
    let storage = Arc::new(S3ObjectStorage::new(&storage_config).await);
    Ok(AnyStore::Remote(RecordStore::remote(
        storage,
        &s3.prefix,
        &s3.scratch,
        config.store.clone(),
    )?))
}

#[cfg(not(feature = "s3"))]
async fn open_s3(_config: &Config, _s3: &crate::config::S3BackendConfig) -> Result<AnyStore> {
    anyhow::bail!("this build has no S3 support; rebuild with `--features s3`")
}
