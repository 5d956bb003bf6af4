//! # Persisted client state
//!
//! A synchronous key/value store for small JSON documents, the local-storage
//! analogue the session and preference stores read at startup.
//!
//! | Key | Contents |
//! |-----|----------|
//! | [`SESSION_KEY`] | the signed-in [`Session`](shared::types::Session) |
//! | [`VISIBLE_FIELDS_KEY`] | the [`FieldVisibility`](shared::types::FieldVisibility) map |
//!
//! [`MemoryStorage`] backs tests and deployments without a storage
//! directory; [`FileStorage`] writes one `<key>.json` file per key.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::debug;

use shared::types::StorageConfig;

pub const SESSION_KEY: &str = "user";
pub const VISIBLE_FIELDS_KEY: &str = "visibleFields";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Synchronous string storage under fixed keys.
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Build the store described by the config.
pub fn open(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    match &config.dir {
        Some(dir) => Ok(Arc::new(FileStorage::open(dir.clone())?)),
        None => Ok(Arc::new(MemoryStorage::new())),
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

/// One `<base>/<key>.json` file per key.
#[derive(Clone, Debug)]
pub struct FileStorage {
    base: PathBuf,
}

impl FileStorage {
    pub fn open(base: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&base)?;
        debug!("File storage rooted at {}", base.display());
        Ok(Self { base })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.base.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key).ok()?;
        std::fs::read_to_string(path).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        // Write-then-rename so a crash never leaves a half-written document.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
