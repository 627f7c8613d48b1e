use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::ObjectStorage;
use crate::error::{Error, Result};

/// Connection settings for an S3 bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3StorageConfig {
    pub bucket:       String,
    pub region:       String,
    /// Endpoint override for S3-compatible services.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl S3StorageConfig {
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket:       bucket.into(),
            region:       region.into(),
            endpoint_url: None,
        }
    }

    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }
}

/// [`ObjectStorage`] backed by an S3 bucket.
pub struct S3ObjectStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl std::fmt::Debug for S3ObjectStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStorage")
            .field("bucket", &self.bucket)
            .field("client", &"<S3Client>")
            .finish()
    }
}

impl S3ObjectStorage {
    /// Build a client from the environment's credential chain.
    pub async fn new(config: &S3StorageConfig) -> Self {
        let mut loader = aws_config::from_env().region(aws_config::Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint_url {
            debug!(endpoint = %endpoint, "using custom S3 endpoint");
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint_url.is_some())
            .build();
        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        }
    }

    /// Wrap a pre-built client.
    pub fn with_client(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    fn storage_error(key: &str, operation: &str, e: impl std::fmt::Display) -> Error {
        let reason = e.to_string();
        error!(bucket_op = operation, key = %key, error = %reason, "S3 request failed");
        Error::Storage {
            key: key.to_string(),
            reason: format!("{operation}: {reason}"),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn exists(&self, key: &str) -> Result<bool> {
        match self.client.head_object().bucket(&self.bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|s| s.is_not_found()) => Ok(false),
            Err(e) => Err(Self::storage_error(key, "head_object", e)),
        }
    }

    async fn put_file(&self, key: &str, path: &Path) -> Result<()> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| Self::storage_error(key, "read staged file", e))?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/warc")
            .body(body)
            .send()
            .await
            .map_err(|e| Self::storage_error(key, "put_object", e))?;
        info!(bucket = %self.bucket, key = %key, "uploaded object");
        Ok(())
    }

    async fn get_range(&self, key: &str, offset: u64, length: u64) -> Result<Option<Vec<u8>>> {
        if length == 0 {
            return Ok(None);
        }
        let range = format!("bytes={}-{}", offset, offset.saturating_add(length - 1));
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .range(range)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) if e.as_service_error().is_some_and(|s| s.is_no_such_key()) => return Ok(None),
            Err(e) if e.raw_response().is_some_and(|r| r.status().as_u16() == 416) => return Ok(None),
            Err(e) => return Err(Self::storage_error(key, "get_object", e)),
        };

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| Self::storage_error(key, "read object body", e))?
            .into_bytes();
        // A range running past the end comes back short rather than failing.
        Ok((data.len() as u64 == length).then(|| data.to_vec()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut token = None;
        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(token)
                .send()
                .await
                .map_err(|e| Self::storage_error(prefix, "list_objects_v2", e))?;
            keys.extend(output.contents().iter().filter_map(|o| o.key().map(str::to_string)));
            match output.next_continuation_token() {
                Some(next) if output.is_truncated().unwrap_or(false) => token = Some(next.to_string()),
                _ => break,
            }
        }
        Ok(keys)
    }
}
