//! Persistent key-value store
//!
//! `PersistentStore` namespaces every key with an application prefix and
//! stores values as JSON text, the way browser local storage is usually
//! used. The raw storage is an injected `Storage` capability:
//! - `MemoryStorage` for tests and `--ephemeral` sessions
//! - `FileStorage` for a JSON file in the user's data directory
//!
//! Reads never fail: a missing entry, an empty entry or an entry that does
//! not decode into the requested type all yield the caller's default.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

/// Prefix applied to every key unless configured otherwise.
pub const DEFAULT_PREFIX: &str = "codepencil";

/// Errors from writing to storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The value could not be encoded as JSON
    #[error("failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// The backing file could not be written
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The storage refused the write for lack of space
    #[error("storage quota exceeded while writing '{key}'")]
    QuotaExceeded { key: String },
}

/// Synchronous string storage, keyed by string.
pub trait Storage {
    /// Read an entry, if present.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Create or replace an entry.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete an entry. Deleting a missing entry is not an error.
    fn remove_item(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get_item(&self, key: &str) -> Option<String> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove_item(key)
    }
}

/// In-process storage.
///
/// Counts successful writes and can enforce a byte quota, which makes it
/// handy for checking how often the playground actually hits storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse writes that would push the total size of keys and values past `bytes`.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Number of successful `set_item` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(quota) = self.quota
            && self.used_bytes_without(key) + key.len() + value.len() > quota
        {
            return Err(StoreError::QuotaExceeded {
                key: key.to_string(),
            });
        }
        self.entries.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Storage backed by a single JSON object file.
///
/// The file is read once when opened. Every write rewrites the whole file
/// through a temp file in the same directory, so a crash mid-write leaves
/// the previous contents intact.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    /// Name of the storage file inside the data directory.
    pub const FILE_NAME: &'static str = "storage.json";

    /// Open (or start) the storage file in `dir`, creating the directory if needed.
    ///
    /// An unreadable or corrupt file is logged and treated as empty.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(Self::FILE_NAME);
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Ignoring corrupt storage file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Could not read storage file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        debug!("Opened {} with {} entries", path.display(), entries.len());
        Ok(Self { path, entries })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let json =
            serde_json::to_string_pretty(&self.entries).map_err(|source| StoreError::Encode {
                key: self.path.display().to_string(),
                source,
            })?;

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}

/// JSON values under namespaced keys.
#[derive(Debug)]
pub struct PersistentStore<S> {
    storage: S,
    prefix: String,
}

impl<S: Storage> PersistentStore<S> {
    /// Wrap `storage` using the default prefix.
    pub fn new(storage: S) -> Self {
        Self::with_prefix(storage, DEFAULT_PREFIX)
    }

    pub fn with_prefix(storage: S, prefix: impl Into<String>) -> Self {
        Self {
            storage,
            prefix: prefix.into(),
        }
    }

    /// The full storage key for `key`.
    ///
    /// The prefix is prepended with no separator, so existing entries
    /// written as `codepencilhtml` keep working.
    pub fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Read `key`, or `default` if it is missing or unreadable.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get_or_else(key, || default)
    }

    /// Read `key`, producing the default lazily if it is missing or unreadable.
    pub fn get_or_else<T, F>(&self, key: &str, default: F) -> T
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        let full_key = self.namespaced(key);
        match self.storage.get_item(&full_key) {
            Some(raw) if !raw.is_empty() => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Treating malformed entry '{}' as absent: {}", full_key, e);
                    default()
                }
            },
            _ => default(),
        }
    }

    /// Encode `value` as JSON and write it under `key`.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let full_key = self.namespaced(key);
        let json = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: full_key.clone(),
            source,
        })?;
        self.storage.set_item(&full_key, &json)
    }

    /// Delete `key`.
    pub fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let full_key = self.namespaced(key);
        self.storage.remove_item(&full_key)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}
