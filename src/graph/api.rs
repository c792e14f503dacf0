// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Injection and lookup.
//!
//! - `inject()` / `inject_with()` - make a record resident, resolving duplicates
//! - `inject_many()` - batch injection in input order
//! - `retrieve()` / `try_retrieve()` - resident lookup only
//! - `find()` / `find_many()` - resident lookup, falling back to the adapter
//! - `remove()` - detach a record from the graph
//! - `filter()` / `all()` / `count()` - typed views over one kind

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::GraphError;
use crate::inject_options::{DuplicateResolution, InjectOptions};
use crate::metrics;
use crate::record::{shared, Record, Shared};
use crate::snapshot::{RebaseOutcome, Snapshots};
use crate::storage::traits::{RecordAdapter, StorageError};
use crate::value::Value;

use super::{Graph, InjectOutcome};

impl Graph {
    // ═══════════════════════════════════════════════════════════════════════════
    // API: Injection
    // ═══════════════════════════════════════════════════════════════════════════

    /// Inject with the configured defaults. See [`Graph::inject_with`].
    pub fn inject<R: Record>(&mut self, record: Shared<R>) -> Result<Shared<R>, GraphError> {
        self.inject_with(record, InjectOptions::default())
    }

    /// Make `record` resident and return the resident reference.
    ///
    /// 1. A record without an identifier gets one from the kind's generator.
    /// 2. The kind's store is created if needed.
    /// 3. Injecting the instance that is already resident changes nothing.
    /// 4. A different resident instance with the same identifier is
    ///    resolved per [`DuplicateResolution`]; every policy except
    ///    `ReplaceReference` returns the resident instance.
    /// 5. Otherwise `record` becomes resident, snapshotted if requested.
    ///
    /// The returned reference may differ from the argument.
    pub fn inject_with<R: Record>(&mut self, record: Shared<R>, options: InjectOptions) -> Result<Shared<R>, GraphError> {
        let resolution = options.resolution.unwrap_or(self.config.default_resolution);
        let (id, exists) = {
            let guard = record.read();
            (guard.id(), guard.exists_in_storage())
        };
        let take_snapshot = options
            .take_snapshot
            .unwrap_or_else(|| self.config.snapshot_policy.resolve(exists));

        let id = match id {
            Some(id) => id,
            None => {
                let id = self.generate_id::<R>()?;
                debug!(kind = R::KIND, id = ?id, "Generated identifier");
                record.write().set_id(id.clone());
                id
            }
        };

        let graph_id = self.id;
        let store = self.ensure_store::<R>()?;

        let mut outcome = InjectOutcome::Inserted;
        if let Some(existing) = store.retrieve(&id) {
            if Arc::ptr_eq(&existing, &record) {
                metrics::record_injection(R::KIND, InjectOutcome::AlreadyResident.as_str());
                return Ok(existing);
            }

            debug!(kind = R::KIND, id = ?id, resolution = %resolution, "Resolving duplicate");
            match resolution {
                DuplicateResolution::KeepExisting => {
                    metrics::record_injection(R::KIND, InjectOutcome::KeptExisting.as_str());
                    return Ok(existing);
                }
                DuplicateResolution::Deserialize => {
                    let incoming = representation(&record)?;
                    let mut guard = existing.write();
                    guard.apply_or_restore(&incoming)?;
                    if exists {
                        guard.graph_state_mut().set_exists_in_storage(true);
                    }
                    if take_snapshot {
                        guard.take_snapshot()?;
                    }
                    drop(guard);
                    metrics::record_injection(R::KIND, InjectOutcome::Deserialized.as_str());
                    return Ok(existing);
                }
                DuplicateResolution::Rebase => {
                    let incoming = representation(&record)?;
                    let mut guard = existing.write();
                    let rebased = guard.rebase_from(&incoming, take_snapshot)?;
                    if exists {
                        guard.graph_state_mut().set_exists_in_storage(true);
                    }
                    drop(guard);
                    if rebased == RebaseOutcome::IncomingWins {
                        warn!(kind = R::KIND, id = ?id, "Rebase could not merge local changes; incoming state kept");
                    }
                    metrics::record_rebase(R::KIND, rebased.as_str());
                    metrics::record_injection(R::KIND, InjectOutcome::Rebased.as_str());
                    return Ok(existing);
                }
                DuplicateResolution::ReplaceReference => {
                    existing.write().graph_state_mut().detach_from(graph_id);
                    outcome = InjectOutcome::Replaced;
                }
            }
        }

        if take_snapshot {
            record.write().take_snapshot()?;
        }
        store.add(Arc::clone(&record))?;

        metrics::record_injection(R::KIND, outcome.as_str());
        metrics::set_resident_records(R::KIND, store.len());
        debug!(kind = R::KIND, id = ?id, snapshot = take_snapshot, "Record injected");
        Ok(record)
    }

    /// Inject each record in order, collecting the resident references.
    ///
    /// Later duplicates in the batch see earlier ones already resident.
    pub fn inject_many<R, I>(&mut self, records: I, options: InjectOptions) -> Result<Vec<Shared<R>>, GraphError>
    where
        R: Record,
        I: IntoIterator<Item = Shared<R>>,
    {
        records
            .into_iter()
            .map(|record| self.inject_with(record, options))
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // API: Lookup
    // ═══════════════════════════════════════════════════════════════════════════

    /// The resident record at `id`, if any.
    ///
    /// Returns `None` when the kind's store holds a different type; use
    /// [`Graph::try_retrieve`] to tell that apart.
    #[must_use]
    pub fn retrieve<R: Record>(&self, id: &R::Id) -> Option<Shared<R>> {
        self.store::<R>()?.retrieve(id)
    }

    /// Like [`Graph::retrieve`], failing with [`GraphError::WrongType`] on
    /// a type mismatch.
    pub fn try_retrieve<R: Record>(&self, id: &R::Id) -> Result<Option<Shared<R>>, GraphError> {
        Ok(self.try_store::<R>()?.and_then(|store| store.retrieve(id)))
    }

    #[must_use]
    pub fn contains<R: Record>(&self, id: &R::Id) -> bool {
        self.store::<R>().is_some_and(|store| store.contains(id))
    }

    /// The resident record at `id`, or the adapter's copy made resident.
    ///
    /// Records loaded from storage are always snapshotted.
    pub fn find<R: Record>(&mut self, id: &R::Id) -> Result<Option<Shared<R>>, GraphError> {
        if let Some(resident) = self.try_retrieve::<R>(id)? {
            metrics::record_lookup(R::KIND, "resident");
            return Ok(Some(resident));
        }

        let loaded = self
            .adapter_for::<R>()?
            .find_by_id(id)
            .map_err(|source| GraphError::Storage { kind: R::KIND, source })?;

        let Some(mut record) = loaded else {
            metrics::record_lookup(R::KIND, "miss");
            return Ok(None);
        };

        metrics::record_lookup(R::KIND, "storage");
        record.graph_state_mut().set_exists_in_storage(true);
        self.inject_with(shared(record), InjectOptions::default().with_snapshot(true))
            .map(Some)
    }

    /// Every stored record whose `field` equals `value`, made resident.
    ///
    /// Records already resident are resolved with the configured
    /// duplicate policy, so the returned references are the resident ones.
    pub fn find_many<R: Record>(&mut self, field: &str, value: &Value) -> Result<Vec<Shared<R>>, GraphError> {
        let loaded = self
            .adapter_for::<R>()?
            .query_by_field(field, value)
            .map_err(|source| GraphError::Storage { kind: R::KIND, source })?;

        metrics::record_lookup(R::KIND, "query");
        let records = loaded.into_iter().map(|mut record| {
            record.graph_state_mut().set_exists_in_storage(true);
            shared(record)
        });
        self.inject_many(records, InjectOptions::default().with_snapshot(true))
    }

    fn adapter_for<R: Record>(&self) -> Result<Arc<dyn RecordAdapter<R>>, GraphError> {
        self.registry.adapter::<R>().ok_or(GraphError::Storage {
            kind: R::KIND,
            source: StorageError::Unavailable {
                kind: R::KIND.to_string(),
            },
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // API: Removal & views
    // ═══════════════════════════════════════════════════════════════════════════

    /// Remove `record` from its store and clear its residency.
    ///
    /// Idempotent. Returns whether the record was resident here. A
    /// different instance resident under the same identifier is left alone.
    pub fn remove<R: Record>(&mut self, record: &Shared<R>) -> bool {
        let Some(id) = record.read().id() else {
            return false;
        };
        let graph_id = self.id;

        let removed = match self.try_store_mut::<R>() {
            Ok(Some(store)) => match store.retrieve(&id) {
                Some(resident) if Arc::ptr_eq(&resident, record) => {
                    store.remove_id(&id);
                    metrics::set_resident_records(R::KIND, store.len());
                    true
                }
                _ => false,
            },
            _ => false,
        };

        record.write().graph_state_mut().detach_from(graph_id);
        if removed {
            debug!(kind = R::KIND, id = ?id, "Record removed");
        }
        removed
    }

    /// Resident records of kind `R` matching `predicate`.
    pub fn filter<R, F>(&self, predicate: F) -> Vec<Shared<R>>
    where
        R: Record,
        F: Fn(&R) -> bool,
    {
        self.store::<R>()
            .map(|store| store.filter(predicate))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn all<R: Record>(&self) -> Vec<Shared<R>> {
        self.store::<R>().map(|store| store.all()).unwrap_or_default()
    }

    /// Resident records of kind `R`.
    #[must_use]
    pub fn count<R: Record>(&self) -> usize {
        self.store::<R>().map_or(0, |store| store.len())
    }
}

fn representation<R: Record>(record: &Shared<R>) -> Result<Value, GraphError> {
    record
        .read()
        .to_value()
        .map_err(|source| GraphError::Representation { kind: R::KIND, source })
}
