// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Graph sync and teardown.
//!
//! A sync pass walks the stores in priority order:
//!
//! ```text
//! before_sync(forced) ──► configured kinds ──► remaining kinds (sorted) ──► after_sync()
//!        │                       │
//!        └─ error: abort         └─ per record: delete+remove | persist+snapshot | skip
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::SyncErrorPolicy;
use crate::error::{GraphError, SyncFailures};
use crate::metrics::{self, SyncTimer};
use crate::record::{Record, Shared};

use super::{Graph, SyncReport};

impl Graph {
    /// Whether any resident record needs syncing.
    #[must_use]
    pub fn needs_sync(&self) -> bool {
        self.stores.values().any(|store| store.needs_sync())
    }

    /// Sync every record that changed. See [`Graph::sync_with`].
    pub fn sync(&mut self) -> Result<SyncReport, GraphError> {
        self.sync_with(false)
    }

    /// Sync the whole graph.
    ///
    /// Stores are visited in [`Graph::sync_order`]. Records marked deleted
    /// are deleted through their adapter and leave the graph; other records
    /// are persisted and re-snapshotted when they changed, or always when
    /// `force` is set.
    ///
    /// Failures follow [`crate::GraphConfig::sync_error_policy`]. The
    /// delegate's `after_sync` only runs when nothing failed.
    #[tracing::instrument(skip(self), fields(graph = %self.id))]
    pub fn sync_with(&mut self, force: bool) -> Result<SyncReport, GraphError> {
        let _timer = SyncTimer::new();

        if let Some(delegate) = &self.delegate {
            if let Err(error) = delegate.before_sync(force) {
                warn!(%error, "Sync aborted by delegate");
                metrics::record_sync_pass("aborted");
                return Err(GraphError::SyncAborted(error));
            }
        }

        let order = self.sync_order();
        let policy = self.config.sync_error_policy;
        info!(kinds = order.len(), records = self.len(), "Starting sync");

        let mut report = SyncReport::default();
        let mut failures = Vec::new();

        for kind in &order {
            let Some(store) = self.stores.get_mut(kind.as_str()) else {
                continue;
            };

            match store.sync(force, policy) {
                Ok(synced) => report += synced,
                Err(failed) => {
                    let (failed, synced) = failed.into_parts();
                    report += synced;
                    failures.extend(failed);
                    if policy == SyncErrorPolicy::Abort {
                        break;
                    }
                }
            }
            metrics::set_resident_records(store.kind(), store.len());
        }

        if !failures.is_empty() {
            warn!(
                failed = failures.len(),
                persisted = report.persisted,
                deleted = report.deleted,
                "Sync finished with failures"
            );
            metrics::record_sync_pass("error");
            return Err(SyncFailures::new(failures, report).into());
        }

        if let Some(delegate) = &self.delegate {
            delegate.after_sync();
        }

        info!(
            persisted = report.persisted,
            deleted = report.deleted,
            skipped = report.skipped,
            "Sync complete"
        );
        metrics::record_sync_pass("success");
        Ok(report)
    }

    /// Kind names in the order a sync visits them: the configured order
    /// first, then every other kind with a store, sorted.
    ///
    /// Configured kinds without a store are included and skipped by sync.
    #[must_use]
    pub fn sync_order(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut order: Vec<String> = self
            .config
            .sync_order
            .iter()
            .filter(|kind| seen.insert(kind.as_str()))
            .cloned()
            .collect();

        order.extend(
            self.store_names()
                .into_iter()
                .filter(|kind| !seen.contains(kind))
                .map(String::from),
        );
        order
    }

    /// Sync one resident record.
    ///
    /// Fails with [`GraphError::NoGraph`] unless `record` is resident in
    /// this graph.
    pub fn sync_record<R: Record>(&mut self, record: &Shared<R>, force: bool) -> Result<SyncReport, GraphError> {
        let (graph, id) = {
            let guard = record.read();
            (guard.enforce_graph()?, guard.id())
        };
        let resident = id
            .as_ref()
            .and_then(|id| self.retrieve::<R>(id))
            .is_some_and(|resident| Arc::ptr_eq(&resident, record));
        if graph != self.id || !resident {
            return Err(GraphError::NoGraph { kind: R::KIND });
        }

        let Some(id) = id else {
            return Err(GraphError::NoIdentifier { kind: R::KIND });
        };
        let Some(store) = self.try_store_mut::<R>()? else {
            return Err(GraphError::NoGraph { kind: R::KIND });
        };
        let report = store.sync_id(&id, force)?;
        metrics::set_resident_records(R::KIND, store.len());
        Ok(report)
    }

    /// Drop every store. Records are detached, nothing is saved or deleted.
    pub fn clear(&mut self) {
        let records = self.len();
        for store in self.stores.values_mut() {
            store.detach_all();
            metrics::set_resident_records(store.kind(), 0);
        }
        self.stores.clear();
        debug!(graph = %self.id, records, "Graph cleared");
    }
}
