// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Record graph.
//!
//! The [`Graph`] ties together one [`EntityStore`] per record kind:
//! - stores are created lazily on first injection
//! - duplicate injections are resolved by [`crate::DuplicateResolution`]
//! - sync walks the stores in priority order through each kind's adapter
//!
//! # Residency
//!
//! ```text
//! absent ──inject──► resident ──remove / clear / delete+sync──► detached
//! ```
//!
//! # Example
//!
//! ```rust
//! use record_graph::Graph;
//!
//! let graph = Graph::builder()
//!     .sync_order(["person", "car"])
//!     .build();
//!
//! assert!(graph.is_empty());
//! assert_eq!(graph.config().sync_order, vec!["person", "car"]);
//! ```

mod api;
mod lifecycle;
mod registry;
mod types;

pub use types::{BoxError, SyncDelegate, SyncReport};
pub(crate) use types::InjectOutcome;

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::GraphConfig;
use crate::error::GraphError;
use crate::record::{GraphId, Record};
use crate::storage::id_gen::IdGenerator;
use crate::storage::traits::RecordAdapter;
use crate::store::{EntityStore, ErasedStore};
use registry::Registry;

/// Identity map over many record kinds.
pub struct Graph {
    id: GraphId,
    config: GraphConfig,
    stores: HashMap<&'static str, Box<dyn ErasedStore>>,
    registry: Registry,
    delegate: Option<Arc<dyn SyncDelegate>>,
}

impl Graph {
    /// Create a graph with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    #[must_use]
    pub fn with_config(config: GraphConfig) -> Self {
        let id = GraphId::next();
        debug!(graph = %id, "Graph created");
        Self {
            id,
            config,
            stores: HashMap::new(),
            registry: Registry::default(),
            delegate: None,
        }
    }

    #[must_use]
    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    /// Handle that resident records point back to.
    #[must_use]
    pub fn id(&self) -> GraphId {
        self.id
    }

    #[must_use]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Register the storage adapter for `R`.
    ///
    /// An existing store for the kind switches to the new adapter.
    pub fn register<R: Record>(&mut self, adapter: Arc<dyn RecordAdapter<R>>) -> Result<(), GraphError> {
        self.registry.entry::<R>()?.adapter = Some(Arc::clone(&adapter));
        if let Some(store) = self.stores.get_mut(R::KIND) {
            store
                .as_any_mut()
                .downcast_mut::<EntityStore<R>>()
                .ok_or(GraphError::WrongType {
                    kind: R::KIND,
                    expected: type_name::<R>(),
                })?
                .set_adapter(adapter);
        }
        debug!(graph = %self.id, kind = R::KIND, "Adapter registered");
        Ok(())
    }

    /// Register the identifier generator used for `R` records injected
    /// without an identifier.
    pub fn set_id_generator<R: Record>(&mut self, generator: IdGenerator<R::Id>) -> Result<(), GraphError> {
        self.registry.entry::<R>()?.id_generator = Some(generator);
        Ok(())
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn SyncDelegate>) {
        self.delegate = Some(delegate);
    }

    /// The store for `R`, if one exists and holds `R`.
    #[must_use]
    pub fn store<R: Record>(&self) -> Option<&EntityStore<R>> {
        self.try_store::<R>().ok().flatten()
    }

    /// The store for `R`, failing with [`GraphError::WrongType`] when the
    /// kind's store holds a different record type.
    pub fn try_store<R: Record>(&self) -> Result<Option<&EntityStore<R>>, GraphError> {
        match self.stores.get(R::KIND) {
            None => Ok(None),
            Some(store) => store
                .as_any()
                .downcast_ref::<EntityStore<R>>()
                .map(Some)
                .ok_or(GraphError::WrongType {
                    kind: R::KIND,
                    expected: type_name::<R>(),
                }),
        }
    }

    fn try_store_mut<R: Record>(&mut self) -> Result<Option<&mut EntityStore<R>>, GraphError> {
        match self.stores.get_mut(R::KIND) {
            None => Ok(None),
            Some(store) => store
                .as_any_mut()
                .downcast_mut::<EntityStore<R>>()
                .map(Some)
                .ok_or(GraphError::WrongType {
                    kind: R::KIND,
                    expected: type_name::<R>(),
                }),
        }
    }

    /// The store for `R`, created with the registered adapter if absent.
    fn ensure_store<R: Record>(&mut self) -> Result<&mut EntityStore<R>, GraphError> {
        if !self.stores.contains_key(R::KIND) {
            let store = EntityStore::<R>::owned_by(self.id, self.registry.adapter::<R>());
            debug!(graph = %self.id, kind = R::KIND, adapter = store.has_adapter(), "Store created");
            self.stores.insert(R::KIND, Box::new(store));
        }
        self.try_store_mut::<R>()?.ok_or(GraphError::WrongType {
            kind: R::KIND,
            expected: type_name::<R>(),
        })
    }

    fn generate_id<R: Record>(&self) -> Result<R::Id, GraphError> {
        let generator = self
            .registry
            .id_generator::<R>()
            .ok_or(GraphError::NoIdentifierGenerator { kind: R::KIND })?;
        generator(R::KIND).map_err(|source| GraphError::IdGeneration { kind: R::KIND, source })
    }

    /// Kinds with a store, sorted.
    #[must_use]
    pub fn store_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.stores.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Resident records across every kind.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.values().map(|store| store.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Graph {
    fn drop(&mut self) {
        // Records may outlive the graph; leave none pointing at it.
        for store in self.stores.values_mut() {
            store.detach_all();
        }
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<_> = self
            .store_names()
            .into_iter()
            .map(|name| (name, self.stores.get(name).map_or(0, |store| store.len())))
            .collect();
        f.debug_struct("Graph")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("stores", &counts)
            .field("delegate", &self.delegate.is_some())
            .finish()
    }
}

type Setup = Box<dyn FnOnce(&mut Graph) -> Result<(), GraphError>>;

/// Builder for a [`Graph`] with adapters and generators registered up
/// front.
#[derive(Default)]
pub struct GraphBuilder {
    config: GraphConfig,
    setup: Vec<Setup>,
    delegate: Option<Arc<dyn SyncDelegate>>,
}

impl GraphBuilder {
    #[must_use]
    pub fn config(mut self, config: GraphConfig) -> Self {
        self.config = config;
        self
    }

    /// Kinds to sync first, in order.
    #[must_use]
    pub fn sync_order<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.sync_order = kinds.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn register<R: Record>(mut self, adapter: Arc<dyn RecordAdapter<R>>) -> Self {
        self.setup.push(Box::new(move |graph| graph.register::<R>(adapter)));
        self
    }

    #[must_use]
    pub fn id_generator<R: Record>(mut self, generator: IdGenerator<R::Id>) -> Self {
        self.setup.push(Box::new(move |graph| graph.set_id_generator::<R>(generator)));
        self
    }

    #[must_use]
    pub fn delegate(mut self, delegate: Arc<dyn SyncDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// Build the graph.
    ///
    /// Fails with [`GraphError::WrongType`] when two record types were
    /// registered under one kind name.
    pub fn try_build(self) -> Result<Graph, GraphError> {
        let mut graph = Graph::with_config(self.config);
        for setup in self.setup {
            setup(&mut graph)?;
        }
        graph.delegate = self.delegate;
        Ok(graph)
    }

    /// Build the graph, skipping conflicting registrations.
    #[must_use]
    pub fn build(self) -> Graph {
        let mut graph = Graph::with_config(self.config);
        for setup in self.setup {
            if let Err(error) = setup(&mut graph) {
                tracing::warn!(%error, "Registration skipped");
            }
        }
        graph.delegate = self.delegate;
        graph
    }
}
