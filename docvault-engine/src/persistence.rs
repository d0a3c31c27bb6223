//! Durable whole-snapshot persistence.
//!
//! Persistence is "save the entire map": every flush serializes the
//! committed entries as a JSON array of `[id, document]` pairs and replaces
//! the previous snapshot in one write. There is no append-only log. The
//! durable medium sits behind the [`StorageBackend`] seam; [`FileBackend`]
//! is the default, writing a single UTF-8 JSON file.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use docvault_core::{
    backend::StorageBackend,
    document::{Document, Id},
    error::StoreResult,
};

/// Default snapshot location when none is configured.
pub const DEFAULT_STORAGE_PATH: &str = "data.json";

/// File-backed snapshot storage.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Creates a backend storing the snapshot at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The resolved snapshot location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn read(&self) -> StoreResult<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, bytes: &[u8]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

/// Serializes the canonical document map to and from the storage backend.
#[derive(Debug)]
pub struct PersistenceManager {
    backend: Box<dyn StorageBackend>,
    enabled: bool,
}

impl PersistenceManager {
    /// Creates a manager over a backend. When `enabled` is false, both
    /// `save` and `load` are no-ops and the store runs purely in memory.
    pub fn new(backend: Box<dyn StorageBackend>, enabled: bool) -> Self {
        Self { backend, enabled }
    }

    /// True when the store persists to the backend.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Writes the entries as the new snapshot, replacing the previous one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`](docvault_core::error::StoreError)
    /// when the backend write fails; the in-memory map remains the source of
    /// truth.
    pub async fn save<T: Serialize>(&self, entries: &[(Id, Document<T>)]) -> StoreResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let bytes = serde_json::to_vec(entries)?;
        self.backend.write(&bytes).await?;
        log::debug!("persisted {} documents", entries.len());
        Ok(())
    }

    /// Reads the snapshot into a list of entries. An absent snapshot is
    /// replaced with an empty-array placeholder; unreadable content is
    /// logged and treated as empty.
    pub async fn load<T: DeserializeOwned>(&self) -> StoreResult<Vec<(Id, Document<T>)>> {
        if !self.enabled {
            return Ok(Vec::new());
        }
        let bytes = match self.backend.read().await? {
            Some(bytes) => bytes,
            None => {
                self.backend.write(b"[]").await?;
                return Ok(Vec::new());
            }
        };
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_slice(&bytes) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                log::warn!("discarding unreadable snapshot: {err}");
                Ok(Vec::new())
            }
        }
    }
}
