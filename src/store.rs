// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Per-kind identity map.
//!
//! An [`EntityStore`] holds exactly one record instance per identifier for
//! one record type. It does not resolve duplicates: [`EntityStore::add`]
//! overwrites, and the graph decides beforehand what should be resident.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::SyncErrorPolicy;
use crate::error::{GraphError, SyncFailure, SyncFailures, SyncOperation};
use crate::graph::SyncReport;
use crate::metrics;
use crate::record::{Deletable, GraphId, Record, Shared};
use crate::snapshot::{Snapshot, Snapshots};
use crate::storage::traits::{RecordAdapter, StorageError};

enum Synced {
    Persisted,
    Deleted,
    Skipped,
}

/// Identity map for records of type `R`.
pub struct EntityStore<R: Record> {
    records: HashMap<R::Id, Shared<R>>,
    adapter: Option<Arc<dyn RecordAdapter<R>>>,
    owner: Option<GraphId>,
}

impl<R: Record> EntityStore<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            adapter: None,
            owner: None,
        }
    }

    #[must_use]
    pub fn with_adapter(adapter: Arc<dyn RecordAdapter<R>>) -> Self {
        Self {
            adapter: Some(adapter),
            ..Self::new()
        }
    }

    /// A store whose records are resident in `graph`.
    pub(crate) fn owned_by(graph: GraphId, adapter: Option<Arc<dyn RecordAdapter<R>>>) -> Self {
        Self {
            records: HashMap::new(),
            adapter,
            owner: Some(graph),
        }
    }

    pub fn set_adapter(&mut self, adapter: Arc<dyn RecordAdapter<R>>) {
        self.adapter = Some(adapter);
    }

    #[must_use]
    pub fn has_adapter(&self) -> bool {
        self.adapter.is_some()
    }

    /// Insert `record` under its identifier, replacing any prior entry.
    pub fn add(&mut self, record: Shared<R>) -> Result<(), GraphError> {
        let id = {
            let mut guard = record.write();
            let id = guard.id().ok_or(GraphError::NoIdentifier { kind: R::KIND })?;
            if let Some(owner) = self.owner {
                guard.graph_state_mut().attach(owner);
            }
            id
        };
        self.records.insert(id, record);
        Ok(())
    }

    #[must_use]
    pub fn retrieve(&self, id: &R::Id) -> Option<Shared<R>> {
        self.records.get(id).cloned()
    }

    /// Remove the entry at the record's identifier.
    ///
    /// No-op when the record has no identifier or nothing is stored there.
    pub fn remove(&mut self, record: &R) -> Option<Shared<R>> {
        let id = record.id()?;
        self.records.remove(&id)
    }

    pub fn remove_id(&mut self, id: &R::Id) -> Option<Shared<R>> {
        self.records.remove(id)
    }

    #[must_use]
    pub fn contains(&self, id: &R::Id) -> bool {
        self.records.contains_key(id)
    }

    /// Resident records matching `predicate`, in no particular order.
    pub fn filter<F>(&self, predicate: F) -> Vec<Shared<R>>
    where
        F: Fn(&R) -> bool,
    {
        self.records
            .values()
            .filter(|record| predicate(&record.read()))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn all(&self) -> Vec<Shared<R>> {
        self.records.values().cloned().collect()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<R::Id> {
        self.records.keys().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any resident record needs syncing.
    #[must_use]
    pub fn needs_sync(&self) -> bool {
        self.records.values().any(|record| record.read().needs_sync())
    }

    /// Persist or delete every record that needs it.
    ///
    /// Deleted records leave the store once storage confirms. With
    /// [`SyncErrorPolicy::Continue`] every record is attempted and all
    /// failures come back together; with [`SyncErrorPolicy::Abort`] the
    /// pass stops at the first one.
    pub fn sync(&mut self, force: bool, policy: SyncErrorPolicy) -> Result<SyncReport, SyncFailures> {
        let mut report = SyncReport::default();
        let mut failures = Vec::new();
        let mut removed = Vec::new();

        for (id, record) in &self.records {
            match self.sync_record(id, record, force) {
                Ok(Synced::Persisted) => report.persisted += 1,
                Ok(Synced::Deleted) => {
                    report.deleted += 1;
                    removed.push(id.clone());
                }
                Ok(Synced::Skipped) => report.skipped += 1,
                Err(failure) => {
                    warn!(
                        kind = R::KIND,
                        id = %failure.id,
                        operation = failure.operation.as_str(),
                        error = %failure.source,
                        "Record sync failed"
                    );
                    failures.push(failure);
                    if policy == SyncErrorPolicy::Abort {
                        break;
                    }
                }
            }
        }

        for id in &removed {
            self.records.remove(id);
        }

        debug!(
            kind = R::KIND,
            persisted = report.persisted,
            deleted = report.deleted,
            skipped = report.skipped,
            failed = failures.len(),
            "Store synced"
        );

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(SyncFailures::new(failures, report))
        }
    }

    /// Sync the single record stored at `id`. Nothing happens if absent.
    pub fn sync_id(&mut self, id: &R::Id, force: bool) -> Result<SyncReport, SyncFailures> {
        let mut report = SyncReport::default();
        let Some(record) = self.records.get(id).cloned() else {
            return Ok(report);
        };

        match self.sync_record(id, &record, force) {
            Ok(Synced::Persisted) => report.persisted += 1,
            Ok(Synced::Deleted) => {
                report.deleted += 1;
                self.records.remove(id);
            }
            Ok(Synced::Skipped) => report.skipped += 1,
            Err(failure) => return Err(SyncFailures::new(vec![failure], report)),
        }
        Ok(report)
    }

    fn sync_record(&self, id: &R::Id, record: &Shared<R>, force: bool) -> Result<Synced, SyncFailure> {
        let mut guard = record.write();
        if !force && !guard.needs_sync() {
            return Ok(Synced::Skipped);
        }

        let operation = if guard.is_marked_deleted() {
            SyncOperation::Delete
        } else {
            SyncOperation::Persist
        };

        let Some(adapter) = &self.adapter else {
            metrics::record_sync_operation(R::KIND, operation.as_str(), "unavailable");
            return Err(self.failure(id, record, operation, StorageError::Unavailable {
                kind: R::KIND.to_string(),
            }));
        };

        let result = match operation {
            SyncOperation::Delete => adapter.delete(&guard).map(|()| {
                let state = guard.graph_state_mut();
                state.set_exists_in_storage(false);
                if let Some(owner) = self.owner {
                    state.detach_from(owner);
                }
                Synced::Deleted
            }),
            SyncOperation::Persist => guard
                .to_value()
                .map_err(StorageError::from)
                .and_then(|current| {
                    adapter.persist(&guard)?;
                    let state = guard.graph_state_mut();
                    state.set_snapshot(Some(Snapshot::new(current)));
                    state.set_exists_in_storage(true);
                    Ok(Synced::Persisted)
                }),
        };

        match result {
            Ok(synced) => {
                metrics::record_sync_operation(R::KIND, operation.as_str(), "success");
                Ok(synced)
            }
            Err(source) => {
                metrics::record_sync_operation(R::KIND, operation.as_str(), "error");
                Err(self.failure(id, record, operation, source))
            }
        }
    }

    fn failure(&self, id: &R::Id, record: &Shared<R>, operation: SyncOperation, source: StorageError) -> SyncFailure {
        SyncFailure::new(R::KIND, format!("{id:?}"), operation, Arc::clone(record), source)
    }

    /// Clear residency on every held record and forget them.
    pub(crate) fn detach_all(&mut self) {
        if let Some(owner) = self.owner {
            for record in self.records.values() {
                record.write().graph_state_mut().detach_from(owner);
            }
        }
        self.records.clear();
    }
}

impl<R: Record> Default for EntityStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of an [`EntityStore`], so one graph can hold stores
/// for many record types.
pub(crate) trait ErasedStore: Send + Sync {
    fn kind(&self) -> &'static str;
    fn len(&self) -> usize;
    fn needs_sync(&self) -> bool;
    fn sync(&mut self, force: bool, policy: SyncErrorPolicy) -> Result<SyncReport, SyncFailures>;
    fn detach_all(&mut self);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<R: Record> ErasedStore for EntityStore<R> {
    fn kind(&self) -> &'static str {
        R::KIND
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn needs_sync(&self) -> bool {
        EntityStore::needs_sync(self)
    }

    fn sync(&mut self, force: bool, policy: SyncErrorPolicy) -> Result<SyncReport, SyncFailures> {
        EntityStore::sync(self, force, policy)
    }

    fn detach_all(&mut self) {
        EntityStore::detach_all(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
