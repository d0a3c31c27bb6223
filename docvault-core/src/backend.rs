//! Storage backend abstraction for durable snapshots.
//!
//! The persistence layer treats the durable medium as an opaque collaborator:
//! the store serializes its whole document map to bytes and the backend reads
//! or replaces the snapshot as a unit. The engine ships a file-backed default
//! implementation; alternative media (an object store, a test double) only
//! need these two methods.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::StoreResult;

/// Abstract interface for whole-snapshot storage.
///
/// Implementations must be thread-safe; both methods may be called from any
/// async task. A `write` replaces the previous snapshot entirely — backends
/// never append.
#[async_trait]
pub trait StorageBackend: Send + Sync + Debug {
    /// Reads the current snapshot, or `None` when no snapshot exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`](crate::error::StoreError) when the
    /// medium cannot be read for any reason other than absence.
    async fn read(&self) -> StoreResult<Option<Vec<u8>>>;

    /// Replaces the snapshot with `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`](crate::error::StoreError) when the
    /// medium cannot be written.
    async fn write(&self, bytes: &[u8]) -> StoreResult<()>;
}
