// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use crate::record::Record;
use crate::value::{Value, ValueError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Item not found")]
    NotFound,
    #[error("No adapter registered for {kind}")]
    Unavailable { kind: String },
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Record '{id}' rejected: {reason}")]
    Rejected { id: String, reason: String },
    #[error("Operation not supported by adapter: {operation}")]
    Unsupported { operation: &'static str },
    #[error("Representation error: {0}")]
    Representation(#[from] ValueError),
}

/// Per-kind storage I/O.
///
/// The graph never talks to storage directly: persisting, deleting and
/// loading records all go through the adapter registered for the kind.
/// Calls are synchronous and never retried by the graph.
pub trait RecordAdapter<R: Record>: Send + Sync {
    /// Write the record's current state.
    fn persist(&self, record: &R) -> Result<(), StorageError>;

    /// Remove the record from storage.
    fn delete(&self, record: &R) -> Result<(), StorageError>;

    /// Load one record by identifier.
    fn find_by_id(&self, id: &R::Id) -> Result<Option<R>, StorageError>;

    /// Load every record whose `field` equals `value`.
    ///
    /// Default implementation reports the operation as unsupported.
    fn query_by_field(&self, field: &str, value: &Value) -> Result<Vec<R>, StorageError> {
        let _ = (field, value);
        Err(StorageError::Unsupported { operation: "query_by_field" })
    }
}
