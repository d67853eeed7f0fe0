//! Client-side key-value stores.
//!
//! The console keeps two small string-to-string stores: a *local* store
//! (credential, preferences) and a *session* store (the per-entity selection
//! slots). Both are cleared on logout.
//!
//! Two implementations are provided:
//!
//! - [`MemoryStore`] — in-process, for tests and embedding
//! - [`FileStore`] — one JSON object per file, used by the CLI

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::error::{ConsoleError, Result};

/// A string key-value store.
///
/// Implementations must be safe to share across async tasks.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Returns `Ok(None)` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Store`] if the backing storage fails.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, overwriting any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Store`] if the backing storage fails.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Store`] if the backing storage fails.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Remove every key.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Store`] if the backing storage fails.
    async fn clear(&self) -> Result<()>;
}

/// An in-memory store backed by a `BTreeMap`.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// Whether the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.data
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.data.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.data.write().await.clear();
        Ok(())
    }
}

/// A store persisted as a single JSON object on disk.
///
/// The file is re-read on every access so that separate CLI invocations see
/// each other's writes. Writes go to a sibling temp file that is then renamed
/// over the original.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Create a store backed by `path`. The file and its parent directory are
    /// created lazily on the first write.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                ConsoleError::Store(format!("corrupt store '{}': {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(ConsoleError::Store(format!(
                "failed to read '{}': {e}",
                self.path.display()
            ))),
        }
    }

    async fn save(&self, data: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ConsoleError::Store(format!("failed to create '{}': {e}", parent.display()))
            })?;
        }
        let body = serde_json::to_vec_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| ConsoleError::Store(format!("failed to write '{}': {e}", tmp.display())))?;

        // The local store holds the credential.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&tmp, perms).await.map_err(|e| {
                ConsoleError::Store(format!("failed to set permissions on '{}': {e}", tmp.display()))
            })?;
        }

        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            ConsoleError::Store(format!("failed to replace '{}': {e}", self.path.display()))
        })
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;
        data.insert(key.to_owned(), value.to_owned());
        self.save(&data).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut data = self.load().await?;
        if data.remove(key).is_some() {
            self.save(&data).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConsoleError::Store(format!(
                "failed to remove '{}': {e}",
                self.path.display()
            ))),
        }
    }
}
