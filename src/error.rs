// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Graph errors.
//!
//! Diff and merge never fail loudly (they return `None`); everything the
//! graph can refuse to do is a [`GraphError`]. Sync failures carry the
//! offending record so callers can inspect or retry it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::graph::{BoxError, SyncReport};
use crate::record::Shared;
use crate::storage::traits::StorageError;
use crate::value::ValueError;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("{kind} record has no identifier")]
    NoIdentifier { kind: &'static str },

    #[error("no identifier generator registered for {kind}")]
    NoIdentifierGenerator { kind: &'static str },

    #[error("identifier generation failed for {kind}: {source}")]
    IdGeneration {
        kind: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("{kind} record is not resident in a graph")]
    NoGraph { kind: &'static str },

    #[error("{kind} record has no snapshot")]
    NoSnapshot { kind: &'static str },

    #[error("store for {kind} does not hold {expected}")]
    WrongType { kind: &'static str, expected: &'static str },

    #[error("representation error for {kind}: {source}")]
    Representation {
        kind: &'static str,
        #[source]
        source: ValueError,
    },

    #[error("storage error for {kind}: {source}")]
    Storage {
        kind: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("sync aborted by delegate: {0}")]
    SyncAborted(#[source] BoxError),

    #[error(transparent)]
    Sync(#[from] SyncFailures),
}

/// Which adapter call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOperation {
    Persist,
    Delete,
}

impl SyncOperation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SyncOperation::Persist => "persist",
            SyncOperation::Delete => "delete",
        }
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record that failed to sync, with the record itself attached.
#[derive(Error)]
#[error("failed to sync {kind} {id}: {source}")]
pub struct SyncFailure {
    pub kind: &'static str,
    /// Debug rendering of the identifier.
    pub id: String,
    pub operation: SyncOperation,
    record: Arc<dyn Any + Send + Sync>,
    #[source]
    pub source: StorageError,
}

impl SyncFailure {
    pub(crate) fn new<R: Send + Sync + 'static>(
        kind: &'static str,
        id: String,
        operation: SyncOperation,
        record: Shared<R>,
        source: StorageError,
    ) -> Self {
        Self { kind, id, operation, record, source }
    }

    /// The offending record, if it is an `R`.
    #[must_use]
    pub fn record<R: Send + Sync + 'static>(&self) -> Option<Shared<R>> {
        Arc::clone(&self.record).downcast::<RwLock<R>>().ok()
    }
}

impl fmt::Debug for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncFailure")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("operation", &self.operation)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Every failure from one sync pass, plus what did succeed.
#[derive(Debug)]
pub struct SyncFailures {
    failures: Vec<SyncFailure>,
    report: SyncReport,
}

impl SyncFailures {
    pub(crate) fn new(failures: Vec<SyncFailure>, report: SyncReport) -> Self {
        Self { failures, report }
    }

    /// The first failure encountered.
    #[must_use]
    pub fn first(&self) -> Option<&SyncFailure> {
        self.failures.first()
    }

    #[must_use]
    pub fn failures(&self) -> &[SyncFailure] {
        &self.failures
    }

    /// Records that synced before or alongside the failures.
    #[must_use]
    pub fn report(&self) -> &SyncReport {
        &self.report
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<SyncFailure>, SyncReport) {
        (self.failures, self.report)
    }
}

impl fmt::Display for SyncFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failures.as_slice() {
            [] => write!(f, "sync failed"),
            [only] => write!(f, "{only}"),
            [first, rest @ ..] => write!(f, "{first} (and {} more)", rest.len()),
        }
    }
}

impl std::error::Error for SyncFailures {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.first().map(|f| f as &(dyn std::error::Error + 'static))
    }
}
