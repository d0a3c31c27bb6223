//! Result types for bulk store operations.

use serde::{Deserialize, Serialize};

use crate::document::Document;

/// The outcome of a `delete_many`/`delete_all` operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    /// Whether the delete ran to completion.
    pub deleted: bool,
    /// The number of documents removed.
    pub n: usize,
}

/// The outcome of an `update_many` operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateManyResult<T> {
    /// Whether the update ran to completion.
    pub updated: bool,
    /// The number of documents updated.
    pub n: usize,
    /// The documents in their updated form.
    pub documents: Vec<Document<T>>,
}
