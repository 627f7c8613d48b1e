use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use super::ObjectStorage;
use crate::error::{Error, Result};

/// Object storage held in memory.
#[derive(Debug, Default)]
pub struct MemoryObjectStorage {
    objects: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryObjectStorage {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.objects
            .read()
            .ok()
            .and_then(|objects| objects.get(key).cloned())
    }

    pub fn len(&self) -> usize { self.objects.read().map(|objects| objects.len()).unwrap_or(0) }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    fn poisoned(key: &str) -> Error {
        Error::Storage {
            key:    key.to_string(),
            reason: "object map lock poisoned".to_string(),
        }
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn exists(&self, key: &str) -> Result<bool> {
        let objects = self.objects.read().map_err(|_| Self::poisoned(key))?;
        Ok(objects.contains_key(key))
    }

    async fn put_file(&self, key: &str, path: &Path) -> Result<()> {
        let data = tokio::fs::read(path).await?;
        let mut objects = self.objects.write().map_err(|_| Self::poisoned(key))?;
        objects.insert(key.to_string(), Bytes::from(data));
        Ok(())
    }

    async fn get_range(&self, key: &str, offset: u64, length: u64) -> Result<Option<Vec<u8>>> {
        let Some(object) = self.get(key) else {
            return Ok(None);
        };
        let (Ok(start), Ok(length)) = (usize::try_from(offset), usize::try_from(length)) else {
            return Ok(None);
        };
        Ok(start
            .checked_add(length)
            .and_then(|end| object.get(start..end))
            .map(<[u8]>::to_vec))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let objects = self.objects.read().map_err(|_| Self::poisoned(prefix))?;
        Ok(objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ranges_are_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("object");
        std::fs::write(&path, b"0123456789").unwrap();

        let storage = MemoryObjectStorage::new();
        storage.put_file("a/b", &path).await.unwrap();

        assert!(storage.exists("a/b").await.unwrap());
        assert_eq!(storage.get_range("a/b", 2, 3).await.unwrap().as_deref(), Some(&b"234"[..]));
        assert_eq!(storage.get_range("a/b", 8, 3).await.unwrap(), None);
        assert_eq!(storage.get_range("missing", 0, 1).await.unwrap(), None);
        assert_eq!(storage.list("a/").await.unwrap(), ["a/b"]);
        assert!(storage.list("b/").await.unwrap().is_empty());
    }
}
