use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;
use tracing::{info, warn};

use crate::media::MovieDetail;

pub const DEFAULT_CACHE_KEY: &str = "challengeMovieCache";

/// A batch must have more successful details than this to be stored.
pub const DEFAULT_MIN_VIABLE_DETAILS: usize = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Text key-value storage for the result cache.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)?;
        Ok(Self { directory })
    }

    pub fn default_directory() -> Option<PathBuf> {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".cache").join("moviesieve"))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
            && key != "."
            && key != "..";
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.directory.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)?) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::write(self.path_for(key)?, value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Single-slot cache holding the most recent detail batch.
///
/// There is no expiry: an entry lives until it is overwritten by a larger
/// than viable batch, cleared, or found to be unparsable.
#[derive(Debug)]
pub struct ResultCache<S> {
    store: S,
    key: String,
    min_viable: usize,
}

impl<S: KeyValueStore> ResultCache<S> {
    pub fn new(store: S, key: impl Into<String>, min_viable: usize) -> Self {
        Self {
            store,
            key: key.into(),
            min_viable,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    #[cfg(test)]
    pub(crate) fn store_ref(&self) -> &S {
        &self.store
    }

    pub fn load(&self) -> Option<Vec<MovieDetail>> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Could not read cache entry '{}': {}", self.key, e);
                return None;
            }
        };

        match serde_json::from_str::<Vec<Option<MovieDetail>>>(&raw) {
            Ok(details) => {
                let details: Vec<MovieDetail> = details.into_iter().flatten().collect();
                info!(
                    "Loaded {} movie details from cache '{}'",
                    details.len(),
                    self.key
                );
                Some(details)
            }
            Err(e) => {
                warn!("Cache '{}' corrupted ({}), clearing it", self.key, e);
                self.clear();
                None
            }
        }
    }

    /// Writes the present details when there are more than the viability
    /// threshold. Returns whether the entry was replaced.
    pub fn store(&self, details: &[Option<MovieDetail>]) -> bool {
        let present: Vec<&MovieDetail> = details.iter().flatten().collect();
        if present.len() <= self.min_viable {
            warn!(
                "Insufficient successful detail fetches ({}), cache not saved",
                present.len()
            );
            return false;
        }

        let serialized = match serde_json::to_string(&present) {
            Ok(s) => s,
            Err(e) => {
                warn!("Could not serialize detail batch: {}", e);
                return false;
            }
        };

        match self.store.set(&self.key, &serialized) {
            Ok(()) => {
                info!("Cached {} movie details under '{}'", present.len(), self.key);
                true
            }
            Err(e) => {
                warn!("Could not write cache entry '{}': {}", self.key, e);
                false
            }
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.remove(&self.key) {
            warn!("Could not clear cache entry '{}': {}", self.key, e);
        }
    }
}
