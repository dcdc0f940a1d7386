//! Key-value persistence for the store's collections.
//!
//! The store itself never touches the medium. Hosts hand a `KeyValueStore`
//! to `Database::load_from` at startup and to `Database::save_to` after each
//! mutation. Failures are logged and swallowed: a failed write leaves the
//! in-memory state untouched and usable for the rest of the session.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Key holding the active task collection.
pub const TASKS_KEY: &str = "daily-focus-tasks";
/// Key holding the category collection.
pub const CATEGORIES_KEY: &str = "super-category-tasks";
/// Key holding the archive.
pub const ARCHIVE_KEY: &str = "archived-tasks";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw string storage addressed by key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Read and decode `key`, falling back to `T::default()` when it is missing
/// or unreadable.
pub fn load<T: DeserializeOwned + Default>(store: &impl KeyValueStore, key: &str) -> T {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            warn!(key, error = %e, "failed to read stored value, starting fresh");
            return T::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "failed to parse stored value, starting fresh");
            T::default()
        }
    }
}

/// Encode and write `value` under `key`. Returns whether the write succeeded.
pub fn save<T: Serialize + ?Sized>(store: &impl KeyValueStore, key: &str, value: &T) -> bool {
    let result = serde_json::to_string_pretty(value)
        .map_err(StorageError::from)
        .and_then(|raw| store.set(key, &raw));
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(key, error = %e, "failed to persist value");
            false
        }
    }
}

/// One JSON file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonDirStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        // Atomic-ish write via temp + rename.
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        f.write_all(value.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}

/// In-process store, for embedding hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
