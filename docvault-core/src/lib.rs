//! Core types for the docvault embedded document store.
//!
//! This crate defines the data model and contracts shared by the docvault
//! workspace:
//!
//! - **Documents and identifiers** ([`document`]) - payloads paired with
//!   validated unique ids
//! - **Condition trees** ([`query`]) - the composable boolean query language
//!   and its constructors
//! - **Bulk operation results** ([`results`]) - delete/update result shapes
//! - **Storage backend abstraction** ([`backend`]) - the durable snapshot
//!   seam used by the persistence layer
//! - **Error handling** ([`error`]) - the error taxonomy and result alias
//!
//! Most applications depend on the `docvault` facade crate instead of using
//! this crate directly.

pub mod backend;
pub mod document;
pub mod error;
pub mod query;
pub mod results;
