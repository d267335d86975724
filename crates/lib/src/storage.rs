//! String-keyed persistent storage for session logs.
//!
//! Each chat feature owns one key. Stores are injected into sessions as
//! `Arc<dyn KeyValueStore>`; [`FileStore`] keeps every key in one JSON object on disk,
//! [`MemoryStore`] is used by tests and ephemeral runs.

use fs2::FileExt;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage file {path} is not a JSON object: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("encoding stored value failed: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Synchronous key-value store. Writes are visible to the next `get` on the same store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store; contents are lost when dropped.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let g = self.inner.read().map_err(|_| StorageError::Poisoned)?;
        Ok(g.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut g = self.inner.write().map_err(|_| StorageError::Poisoned)?;
        g.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut g = self.inner.write().map_err(|_| StorageError::Poisoned)?;
        g.remove(key);
        Ok(())
    }
}

/// JSON-object file store: `{ "<key>": "<value>", ... }`.
///
/// Every call re-reads the file so separate processes sharing it see each other's writes.
/// Reads hold a shared advisory lock; mutations hold an exclusive one for the
/// read-modify-write. A mutation on a file that is not a JSON object starts over from an
/// empty object.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn io_err(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn parse(&self, s: &str) -> Result<BTreeMap<String, String>, StorageError> {
        if s.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(s).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let mut file = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io_err(e)),
        };
        file.lock_shared().map_err(|e| self.io_err(e))?;
        let mut s = String::new();
        let read = file.read_to_string(&mut s).map_err(|e| self.io_err(e));
        if let Err(e) = FileExt::unlock(&file) {
            log::warn!("storage: unlocking {} failed: {}", self.path.display(), e);
        }
        read?;
        self.parse(&s)
    }

    /// Apply `f` to the stored map under an exclusive lock and write the result back.
    fn update(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;
        file.lock_exclusive().map_err(|e| self.io_err(e))?;

        let result = (|| {
            let mut s = String::new();
            file.read_to_string(&mut s).map_err(|e| self.io_err(e))?;
            let mut map = match self.parse(&s) {
                Ok(map) => map,
                Err(e) => {
                    log::warn!("storage: {}; rewriting it", e);
                    BTreeMap::new()
                }
            };
            f(&mut map);
            let out = serde_json::to_string_pretty(&map).map_err(StorageError::Encode)?;
            file.seek(SeekFrom::Start(0)).map_err(|e| self.io_err(e))?;
            file.set_len(0).map_err(|e| self.io_err(e))?;
            file.write_all(out.as_bytes()).map_err(|e| self.io_err(e))?;
            file.sync_data().map_err(|e| self.io_err(e))
        })();

        if let Err(e) = FileExt::unlock(&file) {
            log::warn!("storage: unlocking {} failed: {}", self.path.display(), e);
        }
        result
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        log::debug!("storage: set {} in {}", key, self.path.display());
        self.update(|m| {
            m.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|m| {
            m.remove(key);
        })
    }
}
