//! Error types and result types for document store operations.
//!
//! This module provides the error taxonomy shared by every docvault crate.
//! Use [`StoreResult<T>`] as the return type for fallible operations.

use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with the store.
///
/// Validation failures are always raised before any state change, so a failed
/// mutation leaves the in-memory map, the indexes, and the query cache untouched.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A document, update patch, query, or identifier failed structural validation.
    #[error("Validation error: {0}")]
    Validation(String),
    /// The target of a by-id or by-query update/delete does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
    /// `begin`/`commit`/`rollback` was called out of sequence.
    #[error("Transaction error: {0}")]
    Transaction(String),
    /// An I/O failure occurred while saving or loading the durable snapshot.
    /// The in-memory map remains the source of truth after a failed flush.
    #[error("Persistence error: {0}")]
    Persistence(String),
    /// A payload could not be serialized to or deserialized from its JSON form.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A specialized `Result` type for document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<SerdeJsonError> for StoreError {
    fn from(err: SerdeJsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<IoError> for StoreError {
    fn from(err: IoError) -> Self {
        StoreError::Persistence(err.to_string())
    }
}
