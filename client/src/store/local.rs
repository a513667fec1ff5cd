//! Device-local persistence for guest favorites.
//!
//! While the session is anonymous, favorites live only on-device: a
//! JSON array of coupon ids stored under one fixed key. The store
//! itself is a plain string key-value port so the favorites wrapper
//! stays testable against an in-memory implementation.

use crate::error::Result;
use async_trait::async_trait;
use clip_engine::{codec, FavoriteSet};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Storage key for the locally persisted favorites list.
pub const FAVORITES_KEY: &str = "clip.favorites";

/// A device-local persistent key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Absent keys are `None`, not an error.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any existing one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key. Deleting an absent key is a no-op.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// File-backed key-value store: one file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory is created on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys become file names; anything path-hostile is replaced.
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(name)
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.path_for(key), value).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory key-value store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// The locally persisted favorites list, layered over a [`KeyValueStore`].
pub struct LocalFavorites {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl LocalFavorites {
    /// Wrap a store using the default favorites key.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(store, FAVORITES_KEY)
    }

    /// Wrap a store using a custom key.
    pub fn with_key(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Load the stored set. An absent key is an empty set.
    ///
    /// An undecodable stored value is logged and treated as empty
    /// rather than poisoning every guest session that follows.
    pub async fn load(&self) -> Result<FavoriteSet> {
        let Some(raw) = self.store.get(&self.key).await? else {
            return Ok(FavoriteSet::new());
        };

        match codec::decode_ids(&raw) {
            Ok(set) => Ok(set),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "discarding undecodable local favorites");
                Ok(FavoriteSet::new())
            }
        }
    }

    /// Persist the set under the fixed key.
    pub async fn save(&self, set: &FavoriteSet) -> Result<()> {
        self.store.set(&self.key, &codec::encode_ids(set)).await
    }

    /// Remove the stored set entirely.
    pub async fn clear(&self) -> Result<()> {
        self.store.remove(&self.key).await
    }
}
