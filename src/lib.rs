// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Record Graph
//!
//! An in-process identity map and change-tracking layer between application
//! code and a record store.
//!
//! - Two lookups of the same record by identifier yield the same instance.
//! - Loaded records know whether they changed since load, by comparing
//!   against a snapshot, without a storage round-trip.
//! - Re-loading a record while a modified copy is resident is resolved by a
//!   policy, including a three-way rebase of non-overlapping changes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Graph                              │
//! │  • inject / find / remove                                  │
//! │  • duplicate resolution (keep, deserialize, rebase, replace)│
//! │  • sync in priority order, delegate hooks                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                     (one store per kind)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      EntityStore<R>                         │
//! │  • id → Arc<RwLock<R>>, one instance per identifier        │
//! │  • needs_sync via snapshot comparison                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                    (persist / delete / load)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     RecordAdapter<R>                        │
//! │  • storage I/O, supplied per kind                          │
//! │  • MemoryAdapter for tests and demos                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use record_graph::{
//!     assign, shared, to_value, Graph, GraphState, Identifiable, MemoryAdapter,
//!     Record, Representable, Snapshots, Tracked, Value, ValueError,
//! };
//! use serde::Serialize;
//!
//! #[derive(Debug, Default, Serialize)]
//! struct Person {
//!     id: Option<u64>,
//!     name: String,
//!     rating: i64,
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
//!         assign(&mut self.name, value.get("name"))?;
//!         assign(&mut self.rating, value.get("rating"))
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
//!
//! let adapter = Arc::new(MemoryAdapter::<Person>::new());
//! let mut graph = Graph::builder().register::<Person>(adapter.clone()).build();
//!
//! let dave = graph.inject(shared(Person { id: Some(1), name: "Dave".into(), ..Person::default() }))?;
//! graph.sync()?;
//! assert!(!dave.read().needs_sync());
//!
//! dave.write().rating = 9;
//! assert!(graph.needs_sync());
//!
//! // Same identifier, same instance.
//! let again = graph.find::<Person>(&1)?.unwrap();
//! assert!(Arc::ptr_eq(&dave, &again));
//! # Ok::<(), record_graph::GraphError>(())
//! ```
//!
//! ## Features
//!
//! - **Identity Map**: one instance per identifier per kind
//! - **Change Tracking**: snapshot comparison, diff and revert
//! - **Rebase**: local changes replayed on top of incoming state
//! - **Ordered Sync**: configured kinds first, deletions applied
//! - **Failure Context**: every sync failure carries its record
//!
//! ## Configuration
//!
//! See [`GraphConfig`] for all configuration options.
//!
//! ## Modules
//!
//! - [`graph`]: The [`Graph`] tying stores, adapters and sync together
//! - [`store`]: Per-kind identity map
//! - [`value`]: Structured values with diff and merge
//! - [`snapshot`]: Change detection and rebase
//! - [`record`]: Record capability traits
//! - [`storage`]: Adapter trait, in-memory adapter, id generators

pub mod config;
pub mod error;
pub mod graph;
pub mod inject_options;
pub mod metrics;
pub mod record;
pub mod snapshot;
pub mod storage;
pub mod store;
pub mod value;

pub use config::{GraphConfig, SnapshotPolicy, SyncErrorPolicy};
pub use error::{GraphError, SyncFailure, SyncFailures, SyncOperation};
pub use graph::{BoxError, Graph, GraphBuilder, SyncDelegate, SyncReport};
pub use inject_options::{DuplicateResolution, InjectOptions};
pub use record::{shared, Deletable, GraphId, GraphState, Identifiable, Record, Representable, Shared, Tracked};
pub use snapshot::{RebaseOutcome, Snapshot, Snapshots};
pub use storage::id_gen::{sequence_generator, uuid_generator, IdGenerator};
pub use storage::memory::MemoryAdapter;
pub use storage::traits::{RecordAdapter, StorageError};
pub use store::EntityStore;
pub use value::{assign, diff, from_value, merge, to_value, Map, Value, ValueError, ValueKind};
