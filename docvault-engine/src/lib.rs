//! Storage engine for the docvault embedded document store.
//!
//! This crate implements the engine behind the `docvault` facade:
//!
//! - **Store facade** ([`store`]) - CRUD, queries, transactions, and the
//!   chainable `FindMany` builder
//! - **Condition evaluation** ([`evaluator`]) - matches condition trees
//!   against projected documents
//! - **Secondary indexing** ([`index`]) - equality indexes over registered
//!   field sets
//! - **Caching** ([`cache`]) - the generic LRU/TTL cache and the query cache
//! - **Transactions** ([`transaction`]) - snapshot isolation over the
//!   canonical document map
//! - **Persistence** ([`persistence`]) - whole-snapshot JSON durability
//! - **Operation queue** ([`queue`]) - FIFO serialization of mutations
//! - **Fuzzy search** ([`search`]) - edit-distance scoring over snapshots
//!
//! # Concurrency
//!
//! The engine is single-process and cooperative: it spawns no worker
//! threads (only the optional cache sweeper task), and all shared state
//! lives behind async-aware locks. A [`store::Store`] is a cheap clone
//! handle; clones share one document map.

pub mod cache;
pub mod evaluator;
pub mod index;
pub mod persistence;
pub mod queue;
pub mod search;
pub mod store;
pub mod transaction;

pub use store::{FindMany, Payload, Store, StoreBuilder};
