//! docvault — an embedded, transactional JSON document store.
//!
//! This crate is the primary entry point for users of docvault. It re-exports
//! the core types and the storage engine behind a single dependency and
//! provides a [`prelude`] for convenient imports.
//!
//! # Features
//!
//! - **Typed documents** - define payloads with Serde; the store assigns and
//!   validates unique ids
//! - **Composable queries** - boolean condition trees with comparison, set,
//!   regex, and custom-comparator operators
//! - **Secondary indexes** - O(1) lookups for equality queries over
//!   registered field sets, with transparent full-scan fallback
//! - **Query caching** - bounded LRU/TTL cache with coarse invalidation
//! - **Transactions** - snapshot isolation with commit and rollback
//! - **Optional persistence** - whole-snapshot JSON durability with a
//!   pluggable storage backend
//! - **Write serialization** - an opt-in FIFO queue for strictly ordered
//!   mutations
//!
//! # Quick Start
//!
//! ```ignore
//! use docvault::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> StoreResult<()> {
//!     let store = Store::<User>::builder()
//!         .storage_path("users.json")
//!         .persist_to_disk(true)
//!         .build()
//!         .await?;
//!
//!     let alice = store.create_one(User { name: "Alice".into(), age: 30 }).await?;
//!     println!("created {}", alice.id);
//!
//!     let adults = store
//!         .get_many(Condition::gte("age", 18))
//!         .sort("name", SortOrder::Asc)
//!         .await?;
//!     println!("{} adults", adults.len());
//!
//!     store.begin_transaction().await?;
//!     store.update_by_id(&alice.id, serde_json::json!({ "age": 31 })).await?;
//!     store.commit_transaction().await?;
//!     Ok(())
//! }
//! ```

pub mod prelude;

pub use docvault_core::{
    backend::StorageBackend,
    document::{Document, Id, validate_patch, validate_payload},
    error::{StoreError, StoreResult},
    query::{
        ALL_DOCUMENTS_KEY, Condition, ConditionNode, CustomCompare, Operator, SimpleCondition,
        SortOrder,
    },
    results::{DeleteResult, UpdateManyResult},
};

pub use docvault_engine::{
    cache::{CacheConfig, CacheStats, EvictionStrategy, LruCache},
    persistence::{DEFAULT_STORAGE_PATH, FileBackend},
    search::{FuzzyMatch, FuzzySearch},
    store::{FindMany, Payload, Store, StoreBuilder},
};
