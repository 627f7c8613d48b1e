//! Rotating WARC containers with atomic finalize.
//!
//! # Architecture
//!
//! - [`data`] - [`RecordLocation`] and [`StoreOptions`]
//! - [`core`] - Size accounting and container naming
//! - [`backend`] - Where containers live: a local directory or object storage
//! - [`storage`] - The [`ObjectStorage`] seam with in-memory and S3 implementations
//!
//! A container is written under a hidden staging name and becomes visible
//! under its key only once it is complete. Every record inside is its own
//! gzip member, so `(key, offset, length)` is enough to read it back.

pub mod backend;
pub mod core;
pub mod data;
mod error;
pub mod storage;
mod store;

pub use backend::{ContainerBackend, LocalBackend, RemoteBackend};
pub use data::{RecordLocation, StoreOptions};
pub use error::{Error, Result};
pub use storage::{MemoryObjectStorage, ObjectStorage};
#[cfg(feature = "s3")]
pub use storage::{S3ObjectStorage, S3StorageConfig};
pub use store::RecordStore;
