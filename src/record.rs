// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Record capabilities.
//!
//! A record is any domain type implementing four small traits:
//!
//! - [`Identifiable`]: an optional identifier, assignable once generated
//! - [`Representable`]: conversion to and from a structured [`Value`]
//! - [`Tracked`]: access to the [`GraphState`] the graph keeps on the record
//! - [`Record`]: the kind name tying the above together
//!
//! [`Deletable`] and [`crate::Snapshots`] are blanket extensions on top.
//! The graph and its stores are written purely against these traits.
//!
//! # Example
//!
//! ```
//! use record_graph::{assign, to_value, GraphState, Identifiable, Record, Representable, Tracked, Value, ValueError};
//! use serde::Serialize;
//!
//! #[derive(Debug, Default, Serialize)]
//! struct Person {
//!     id: Option<u64>,
//!     name: String,
//!     #[serde(skip)]
//!     state: GraphState,
//! }
//!
//! impl Identifiable for Person {
//!     type Id = u64;
//!     fn id(&self) -> Option<u64> { self.id }
//!     fn set_id(&mut self, id: u64) { self.id = Some(id); }
//! }
//!
//! impl Representable for Person {
//!     fn to_value(&self) -> Result<Value, ValueError> { to_value(self) }
//!     fn apply_value(&mut self, value: &Value) -> Result<(), ValueError> {
//!         assign(&mut self.id, value.get("id"))?;
//!         assign(&mut self.name, value.get("name"))
//!     }
//! }
//!
//! impl Tracked for Person {
//!     fn graph_state(&self) -> &GraphState { &self.state }
//!     fn graph_state_mut(&mut self) -> &mut GraphState { &mut self.state }
//! }
//!
//! impl Record for Person {
//!     const KIND: &'static str = "person";
//! }
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::GraphError;
use crate::snapshot::Snapshot;
use crate::value::{Value, ValueError};

/// A record shared between the graph and application code.
///
/// Instance identity is pointer identity (`Arc::ptr_eq`).
pub type Shared<R> = Arc<RwLock<R>>;

/// Wrap a record for injection.
pub fn shared<R>(record: R) -> Shared<R> {
    Arc::new(RwLock::new(record))
}

/// Non-owning handle naming the graph a record is resident in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphId(u64);

impl GraphId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph-{}", self.0)
    }
}

/// Bookkeeping the graph keeps on every record.
///
/// Embed one in each record type (skipped from its representation) and
/// expose it through [`Tracked`].
#[derive(Debug, Default)]
pub struct GraphState {
    snapshot: Option<Snapshot>,
    deleted: bool,
    exists: bool,
    graph: Option<GraphId>,
}

impl Clone for GraphState {
    /// Clones are never resident.
    fn clone(&self) -> Self {
        Self {
            snapshot: self.snapshot.clone(),
            deleted: self.deleted,
            exists: self.exists,
            graph: None,
        }
    }
}

impl GraphState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a record loaded from storage.
    #[must_use]
    pub fn persisted() -> Self {
        Self { exists: true, ..Self::default() }
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub(crate) fn set_snapshot(&mut self, snapshot: Option<Snapshot>) {
        self.snapshot = snapshot;
    }

    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub(crate) fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    /// Whether the record is known to exist in persisted storage.
    #[must_use]
    pub fn exists_in_storage(&self) -> bool {
        self.exists
    }

    pub fn set_exists_in_storage(&mut self, exists: bool) {
        self.exists = exists;
    }

    #[must_use]
    pub fn graph(&self) -> Option<GraphId> {
        self.graph
    }

    pub(crate) fn attach(&mut self, graph: GraphId) {
        self.graph = Some(graph);
    }

    /// Clear residency, but only if it still points at `graph`.
    pub(crate) fn detach_from(&mut self, graph: GraphId) {
        if self.graph == Some(graph) {
            self.graph = None;
        }
    }
}

/// A record with an identifier that may not be assigned yet.
pub trait Identifiable {
    type Id: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static;

    fn id(&self) -> Option<Self::Id>;

    fn set_id(&mut self, id: Self::Id);
}

/// A record convertible to and from its structured representation.
pub trait Representable {
    /// The record's current structured representation.
    fn to_value(&self) -> Result<Value, ValueError>;

    /// Overwrite the record's fields in place from a representation.
    fn apply_value(&mut self, value: &Value) -> Result<(), ValueError>;
}

/// A record carrying [`GraphState`].
pub trait Tracked {
    fn graph_state(&self) -> &GraphState;

    fn graph_state_mut(&mut self) -> &mut GraphState;
}

/// A record the graph can hold.
pub trait Record: Identifiable + Representable + Tracked + Send + Sync + 'static {
    /// Entity kind name; one store per kind.
    const KIND: &'static str;

    /// The graph this record is resident in, if any.
    fn graph_id(&self) -> Option<GraphId> {
        self.graph_state().graph()
    }

    fn is_resident(&self) -> bool {
        self.graph_id().is_some()
    }

    /// The resident graph, or [`GraphError::NoGraph`] for a detached record.
    fn enforce_graph(&self) -> Result<GraphId, GraphError> {
        self.graph_id().ok_or(GraphError::NoGraph { kind: Self::KIND })
    }

    fn exists_in_storage(&self) -> bool {
        self.graph_state().exists_in_storage()
    }
}

/// Deletion flag handling for every tracked record.
pub trait Deletable: Tracked {
    /// Mark the record for deletion on the next sync.
    fn mark_deleted(&mut self) {
        self.graph_state_mut().set_deleted(true);
    }

    fn unmark_deleted(&mut self) {
        self.graph_state_mut().set_deleted(false);
    }

    fn is_marked_deleted(&self) -> bool {
        self.graph_state().is_deleted()
    }
}

impl<T: Tracked + ?Sized> Deletable for T {}
