//! Storage trait and implementations

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt storage file {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Storage lock poisoned")]
    Poisoned,
}

pub trait Storage: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;
    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError>;
}

impl<T: Storage + ?Sized> Storage for Box<T> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).get(key)
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        (**self).put(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError> {
        (**self).delete(key)
    }
}

/// In-memory storage (for testing and demos). Clones share the same map.
#[derive(Clone)]
pub struct InMemoryStorage {
    data: Arc<RwLock<HashMap<Vec<u8>, Vec<u8>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for InMemoryStorage {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let data = self.data.read().map_err(|_| StorageError::Poisoned)?;
        Ok(data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let mut data = self.data.write().map_err(|_| StorageError::Poisoned)?;
        data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError> {
        let mut data = self.data.write().map_err(|_| StorageError::Poisoned)?;
        data.remove(key);
        Ok(())
    }
}

/// Single JSON file of hex-encoded key/value pairs.
///
/// The whole file is loaded on open and rewritten (temp file + rename)
/// after every mutation. Blocking I/O: call from `spawn_blocking` in async code.
pub struct FileBackedStorage {
    path: PathBuf,
    data: BTreeMap<String, String>,
}

impl FileBackedStorage {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let data = match std::fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        Ok(Self { path, data })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Undo a mutation whose flush failed, so memory matches the file.
    fn restore(&mut self, key: String, previous: Option<String>) {
        match previous {
            Some(value) => self.data.insert(key, value),
            None => self.data.remove(&key),
        };
    }

    fn flush(&self) -> Result<(), StorageError> {
        let io_err = |source: std::io::Error| StorageError::Io { path: self.path.clone(), source };

        let bytes = serde_json::to_vec_pretty(&self.data).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl Storage for FileBackedStorage {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let Some(encoded) = self.data.get(&hex::encode(key)) else {
            return Ok(None);
        };
        let value = hex::decode(encoded).map_err(|e| StorageError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Some(value))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let key = hex::encode(key);
        let previous = self.data.insert(key.clone(), hex::encode(value));
        self.flush().inspect_err(|_| self.restore(key, previous))
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StorageError> {
        let key = hex::encode(key);
        if let Some(previous) = self.data.remove(&key) {
            self.flush().inspect_err(|_| self.restore(key, Some(previous)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_clones_share_data() {
        let mut a = InMemoryStorage::new();
        let b = a.clone();
        a.put(b"k", b"v").unwrap();
        assert_eq!(b.get(b"k").unwrap(), Some(b"v".to_vec()));
        a.delete(b"k").unwrap();
        assert_eq!(b.get(b"k").unwrap(), None);
    }

    #[test]
    fn test_failed_flush_leaves_data_unchanged() {
        let path = std::env::temp_dir().join(format!("identity-blocked-{}.json", std::process::id()));
        let mut storage = FileBackedStorage::new(&path).unwrap();
        // a directory at the target path makes the final rename fail
        std::fs::create_dir_all(&path).unwrap();

        assert!(matches!(storage.put(b"k", b"v"), Err(StorageError::Io { .. })));
        assert_eq!(storage.get(b"k").unwrap(), None);

        storage.data.insert(hex::encode(b"k"), hex::encode(b"old"));
        assert!(storage.put(b"k", b"new").is_err());
        assert_eq!(storage.get(b"k").unwrap(), Some(b"old".to_vec()));
        assert!(storage.delete(b"k").is_err());
        assert_eq!(storage.get(b"k").unwrap(), Some(b"old".to_vec()));

        std::fs::remove_dir(&path).unwrap();
        let _ = std::fs::remove_file(path.with_extension("tmp"));
    }

    #[test]
    fn test_file_backed_rejects_garbage() {
        let path = std::env::temp_dir().join(format!("identity-garbage-{}.json", std::process::id()));
        std::fs::write(&path, b"not json").unwrap();
        assert!(matches!(FileBackedStorage::new(&path), Err(StorageError::Corrupt { .. })));
        std::fs::remove_file(&path).unwrap();
    }
}
