//! Convenient re-exports of commonly used docvault types.
//!
//! Import this prelude to access the store, the query constructors, and the
//! error types without importing from multiple sub-modules:
//!
//! ```ignore
//! use docvault::prelude::*;
//! ```

pub use docvault_core::{
    document::{Document, Id},
    error::{StoreError, StoreResult},
    query::{Condition, ConditionNode, Operator, SortOrder},
    results::{DeleteResult, UpdateManyResult},
};

pub use docvault_engine::{
    cache::{CacheConfig, EvictionStrategy},
    search::FuzzySearch,
    store::{FindMany, Store, StoreBuilder},
};
