//! Snapshot-isolated transactions over the canonical document map.
//!
//! The transaction manager is the sole owner of the store's document map.
//! While no transaction is open, reads and writes go straight to the
//! canonical map. `begin` clones the canonical map twice — an untouched
//! rollback snapshot and a mutable working copy — and routes all subsequent
//! access to the working copy, so writes made inside the transaction are
//! invisible to the committed view until `commit` promotes the working copy.
//! `rollback` restores the snapshot and discards the working copy.

use indexmap::IndexMap;
use mea::rwlock::RwLock;

use docvault_core::{
    document::{Document, Id},
    error::{StoreError, StoreResult},
};

/// The insertion-ordered document map owned by the transaction manager.
pub type DocMap<T> = IndexMap<Id, Document<T>>;

struct OpenTransaction<T> {
    snapshot: DocMap<T>,
    working: DocMap<T>,
}

struct DbState<T> {
    canonical: DocMap<T>,
    transaction: Option<OpenTransaction<T>>,
}

/// Owns the canonical document map and, while a transaction is open, the
/// snapshot/working-copy pair. At most one transaction may be open at a time.
pub struct TransactionManager<T> {
    state: RwLock<DbState<T>>,
}

impl<T: Clone> TransactionManager<T> {
    /// Creates a manager owning the given initial map.
    pub fn new(initial: DocMap<T>) -> Self {
        Self {
            state: RwLock::new(DbState {
                canonical: initial,
                transaction: None,
            }),
        }
    }

    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transaction`] when one is already open.
    pub async fn begin(&self) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.transaction.is_some() {
            return Err(StoreError::Transaction(
                "a transaction is already in progress".to_owned(),
            ));
        }
        state.transaction = Some(OpenTransaction {
            snapshot: state.canonical.clone(),
            working: state.canonical.clone(),
        });
        Ok(())
    }

    /// Commits the open transaction: the working copy becomes canonical and
    /// the snapshot is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transaction`] when no transaction is open.
    pub async fn commit(&self) -> StoreResult<()> {
        let mut state = self.state.write().await;
        match state.transaction.take() {
            Some(transaction) => {
                state.canonical = transaction.working;
                Ok(())
            }
            None => Err(StoreError::Transaction(
                "no transaction in progress".to_owned(),
            )),
        }
    }

    /// Rolls the open transaction back: the snapshot becomes canonical again
    /// and the working copy is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Transaction`] when no transaction is open.
    pub async fn rollback(&self) -> StoreResult<()> {
        let mut state = self.state.write().await;
        match state.transaction.take() {
            Some(transaction) => {
                state.canonical = transaction.snapshot;
                Ok(())
            }
            None => Err(StoreError::Transaction(
                "no transaction in progress".to_owned(),
            )),
        }
    }

    /// True while a transaction is open.
    pub async fn is_open(&self) -> bool {
        self.state.read().await.transaction.is_some()
    }

    /// Runs a closure over the current map: the working copy while a
    /// transaction is open, the canonical map otherwise.
    pub async fn with_current<R>(&self, f: impl FnOnce(&DocMap<T>) -> R) -> R {
        let state = self.state.read().await;
        let map = match &state.transaction {
            Some(transaction) => &transaction.working,
            None => &state.canonical,
        };
        f(map)
    }

    /// Runs a closure over the current map mutably.
    pub async fn with_current_mut<R>(&self, f: impl FnOnce(&mut DocMap<T>) -> R) -> R {
        let mut state = self.state.write().await;
        let map = match &mut state.transaction {
            Some(transaction) => &mut transaction.working,
            None => &mut state.canonical,
        };
        f(map)
    }

    /// Clones the canonical (committed) entries. Persistence serializes this
    /// view, never an uncommitted working copy.
    pub async fn committed_entries(&self) -> Vec<(Id, Document<T>)> {
        let state = self.state.read().await;
        state
            .canonical
            .iter()
            .map(|(id, doc)| (id.clone(), doc.clone()))
            .collect()
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn doc(name: &str) -> Document<Value> {
        Document::new(Id::generate(), json!({ "name": name }))
    }

    fn manager() -> TransactionManager<Value> {
        TransactionManager::new(DocMap::new())
    }

    #[tokio::test]
    async fn begin_twice_is_an_error() {
        let txn = manager();
        txn.begin().await.unwrap();
        assert!(matches!(
            txn.begin().await,
            Err(StoreError::Transaction(_))
        ));
    }

    #[tokio::test]
    async fn commit_and_rollback_require_an_open_transaction() {
        let txn = manager();
        assert!(matches!(txn.commit().await, Err(StoreError::Transaction(_))));
        assert!(matches!(
            txn.rollback().await,
            Err(StoreError::Transaction(_))
        ));
    }

    #[tokio::test]
    async fn writes_are_invisible_to_the_committed_view_until_commit() {
        let txn = manager();
        txn.begin().await.unwrap();
        let created = doc("milad");
        txn.with_current_mut(|map| {
            map.insert(created.id.clone(), created.clone());
        })
        .await;

        assert_eq!(txn.committed_entries().await.len(), 0);
        assert_eq!(txn.with_current(|map| map.len()).await, 1);

        txn.commit().await.unwrap();
        assert_eq!(txn.committed_entries().await.len(), 1);
        assert!(!txn.is_open().await);
    }

    #[tokio::test]
    async fn rollback_discards_all_writes_since_begin() {
        let txn = manager();
        let kept = doc("kept");
        txn.with_current_mut(|map| {
            map.insert(kept.id.clone(), kept.clone());
        })
        .await;

        txn.begin().await.unwrap();
        let discarded = doc("discarded");
        txn.with_current_mut(|map| {
            map.insert(discarded.id.clone(), discarded.clone());
            map.shift_remove(&kept.id);
        })
        .await;
        txn.rollback().await.unwrap();

        let names: Vec<String> = txn
            .with_current(|map| {
                map.values()
                    .map(|d| d.data["name"].as_str().unwrap().to_owned())
                    .collect()
            })
            .await;
        assert_eq!(names, vec!["kept".to_owned()]);
    }

    #[tokio::test]
    async fn state_is_maintained_between_transactions() {
        let txn = manager();
        txn.begin().await.unwrap();
        let first = doc("alice");
        txn.with_current_mut(|map| {
            map.insert(first.id.clone(), first.clone());
        })
        .await;
        txn.commit().await.unwrap();

        txn.begin().await.unwrap();
        let second = doc("bob");
        txn.with_current_mut(|map| {
            map.insert(second.id.clone(), second.clone());
        })
        .await;
        txn.commit().await.unwrap();

        assert_eq!(txn.committed_entries().await.len(), 2);
    }
}
