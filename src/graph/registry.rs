// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Per-kind registration: adapter and identifier generator.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::GraphError;
use crate::record::Record;
use crate::storage::id_gen::IdGenerator;
use crate::storage::traits::RecordAdapter;

pub(crate) struct Registration<R: Record> {
    pub(crate) adapter: Option<Arc<dyn RecordAdapter<R>>>,
    pub(crate) id_generator: Option<IdGenerator<R::Id>>,
}

impl<R: Record> Default for Registration<R> {
    fn default() -> Self {
        Self {
            adapter: None,
            id_generator: None,
        }
    }
}

/// Registrations keyed by kind name, each typed to one record type.
#[derive(Default)]
pub(crate) struct Registry {
    entries: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl Registry {
    pub(crate) fn get<R: Record>(&self) -> Option<&Registration<R>> {
        self.entries.get(R::KIND)?.downcast_ref::<Registration<R>>()
    }

    /// The registration for `R`, created on first use.
    pub(crate) fn entry<R: Record>(&mut self) -> Result<&mut Registration<R>, GraphError> {
        self.entries
            .entry(R::KIND)
            .or_insert_with(|| Box::new(Registration::<R>::default()))
            .downcast_mut::<Registration<R>>()
            .ok_or(GraphError::WrongType {
                kind: R::KIND,
                expected: type_name::<R>(),
            })
    }

    pub(crate) fn adapter<R: Record>(&self) -> Option<Arc<dyn RecordAdapter<R>>> {
        self.get::<R>()?.adapter.clone()
    }

    pub(crate) fn id_generator<R: Record>(&self) -> Option<IdGenerator<R::Id>> {
        self.get::<R>()?.id_generator.clone()
    }
}
