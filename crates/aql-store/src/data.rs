//! Store value types and options.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Where one record lives: a finalized container and the byte range of its
/// gzip member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordLocation {
    pub key:    String,
    pub offset: u64,
    pub length: u64,
}

impl RecordLocation {
    pub fn new(key: impl Into<String>, offset: u64, length: u64) -> Self {
        Self {
            key: key.into(),
            offset,
            length,
        }
    }
}

impl fmt::Display for RecordLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}+{}", self.key, self.offset, self.length)
    }
}

pub const DEFAULT_MAX_CONTAINER_SIZE: u64 = 1024 * 1024 * 1024;

/// Container rotation and naming options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Upper bound on a container's size in bytes, warcinfo included.
    pub max_container_size:        u64,
    /// Optional cap on data records per container.
    pub max_records_per_container: Option<usize>,
    /// New keys tried after a collision before giving up.
    pub key_retries:               u32,
    /// Extra `warcinfo` fields, e.g. `operator` or `description`.
    pub warcinfo:                  BTreeMap<String, String>,
    /// fsync each container before it is finalized.
    pub sync:                      bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_container_size:        DEFAULT_MAX_CONTAINER_SIZE,
            max_records_per_container: None,
            key_retries:               10,
            warcinfo:                  BTreeMap::new(),
            sync:                      true,
        }
    }
}

impl StoreOptions {
    #[must_use]
    pub fn max_container_size(mut self, bytes: u64) -> Self {
        self.max_container_size = bytes;
        self
    }

    #[must_use]
    pub fn max_records_per_container(mut self, records: usize) -> Self {
        self.max_records_per_container = Some(records.max(1));
        self
    }

    #[must_use]
    pub fn key_retries(mut self, retries: u32) -> Self {
        self.key_retries = retries;
        self
    }

    #[must_use]
    pub fn warcinfo_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.warcinfo.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = StoreOptions::default();
        assert_eq!(options.max_container_size, 1 << 30);
        assert_eq!(options.max_records_per_container, None);
        assert_eq!(options.key_retries, 10);
    }

    #[test]
    fn location_display() {
        assert_eq!(RecordLocation::new("abc", 10, 20).to_string(), "abc:10+20");
    }
}
