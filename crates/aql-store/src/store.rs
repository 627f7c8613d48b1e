use std::path::PathBuf;
use std::sync::Arc;

use aql_warc::{WarcRecord, decode_member, encode_member};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::backend::{ContainerBackend, LocalBackend, RemoteBackend};
use crate::core::{fits, warcinfo_record};
use crate::data::{RecordLocation, StoreOptions};
use crate::error::{Error, Result};
use crate::storage::ObjectStorage;

/// Room left for the per-container warcinfo member when checking that a
/// record can fit an empty container. Its compressed size varies by a few
/// bytes with the record id and date.
const WARCINFO_SLACK: u64 = 64;

type KeySource = Box<dyn Fn() -> String + Send + Sync>;

/// Writes records into rotating containers and reads them back by location.
///
/// One writer at a time: concurrent [`write`](Self::write) calls queue on
/// an async mutex. Reads never wait for writers.
pub struct RecordStore<B: ContainerBackend> {
    backend: B,
    options: StoreOptions,
    keys:    KeySource,
    writer:  Mutex<()>,
}

impl<B: ContainerBackend + std::fmt::Debug> std::fmt::Debug for RecordStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("backend", &self.backend)
            .field("options", &self.options)
            .finish()
    }
}

impl RecordStore<LocalBackend> {
    /// A store of container files under `root`.
    pub fn local(root: impl Into<PathBuf>, options: StoreOptions) -> Result<Self> {
        Ok(Self::new(LocalBackend::new(root)?, options))
    }
}

impl RecordStore<RemoteBackend> {
    /// A store of objects under `prefix`, assembled in `scratch` first.
    pub fn remote(
        storage: Arc<dyn ObjectStorage>,
        prefix: impl Into<String>,
        scratch: impl Into<PathBuf>,
        options: StoreOptions,
    ) -> Result<Self> {
        Ok(Self::new(RemoteBackend::new(storage, prefix, scratch)?, options))
    }
}

impl<B: ContainerBackend> RecordStore<B> {
    pub fn new(backend: B, options: StoreOptions) -> Self {
        Self {
            backend,
            options,
            keys: Box::new(|| uuid::Uuid::new_v4().to_string()),
            writer: Mutex::new(()),
        }
    }

    /// Replace the random key generator.
    #[must_use]
    pub fn with_key_source(mut self, keys: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.keys = Box::new(keys);
        self
    }

    pub fn backend(&self) -> &B { &self.backend }

    pub fn options(&self) -> &StoreOptions { &self.options }

    /// Store `records`, rotating containers as size or count limits are hit.
    ///
    /// Locations are returned in input order, and only for containers that
    /// have been finalized.
    ///
    /// # Errors
    ///
    /// - [`Error::RecordTooLarge`] if any record can never fit a container;
    ///   checked before anything is written
    /// - [`Error::CollisionRetryExhausted`] if no free key was found
    /// - [`Error::Interrupted`] if a container failed after others were
    ///   finalized; it carries the locations of everything already stored
    pub async fn write(
        &self,
        records: impl IntoIterator<Item = WarcRecord>,
    ) -> Result<Vec<(WarcRecord, RecordLocation)>> {
        let _writer = self.writer.lock().await;

        let max = self.options.max_container_size;
        let info_len = encode_member(&warcinfo_record("probe", &self.options))?.len() as u64;
        let mut encoded = Vec::new();
        for record in records {
            let member = encode_member(&record)?;
            let size = member.len() as u64;
            if size.saturating_add(info_len + WARCINFO_SLACK) > max {
                return Err(Error::RecordTooLarge { size, max });
            }
            encoded.push((record, member));
        }

        let mut written = Vec::new();
        match self.fill_containers(encoded, &mut written).await {
            Ok(()) => Ok(written),
            Err(e) if written.is_empty() => Err(e),
            Err(e) => Err(Error::Interrupted {
                written,
                source: Box::new(e),
            }),
        }
    }

    /// Append members into as many containers as needed, pushing every
    /// finalized container's locations to `written` as soon as it commits.
    async fn fill_containers(
        &self,
        encoded: Vec<(WarcRecord, Vec<u8>)>,
        written: &mut Vec<(WarcRecord, RecordLocation)>,
    ) -> Result<()> {
        let max = self.options.max_container_size;
        let mut queue = encoded.into_iter();
        let mut pending = queue.next();

        while pending.is_some() {
            let (key, mut container) = self.open_container().await?;
            container.append(&encode_member(&warcinfo_record(&key, &self.options))?)?;

            let mut placed = Vec::new();
            while let Some((record, member)) = pending.take() {
                let length = member.len() as u64;
                if !fits(container.len(), length, placed.len(), &self.options) {
                    pending = Some((record, member));
                    break;
                }
                let offset = container.append(&member)?;
                placed.push((record, RecordLocation::new(key.clone(), offset, length)));
                pending = queue.next();
            }

            if placed.is_empty() {
                // Only reachable when the warcinfo came out larger than the
                // allowance above; the staging file is dropped unpublished.
                let size = pending.as_ref().map_or(0, |(_, member)| member.len() as u64);
                return Err(Error::RecordTooLarge { size, max });
            }

            let size = container.len();
            self.backend.commit(&key, container).await?;
            info!(container = %key, records = placed.len(), size, "finalized container");
            written.extend(placed);
        }

        Ok(())
    }

    /// Read one record back.
    ///
    /// # Errors
    ///
    /// [`Error::LocationNotFound`] for unknown keys, containers not yet
    /// finalized and ranges past the end of a container.
    pub async fn read(&self, location: &RecordLocation) -> Result<WarcRecord> {
        let member = self
            .backend
            .read_range(&location.key, location.offset, location.length)
            .await?;
        Ok(decode_member(&member)?)
    }

    /// Keys of every finalized container.
    pub async fn containers(&self) -> Result<Vec<String>> { self.backend.containers().await }

    async fn open_container(&self) -> Result<(String, aql_fs::StagedFile)> {
        let attempts = self.options.key_retries.saturating_add(1);
        for attempt in 1..=attempts {
            let key = (self.keys)();
            if self.backend.exists(&key).await? {
                debug!(container = %key, attempt, "container key taken");
                continue;
            }
            match self.backend.stage(&key, self.options.sync) {
                Ok(staged) => return Ok((key, staged)),
                Err(Error::Fs(aql_fs::Error::AlreadyExists(_))) => {
                    debug!(container = %key, attempt, "container key taken while staging");
                }
                Err(e) => return Err(e),
            }
        }
        Err(Error::CollisionRetryExhausted { attempts })
    }
}
