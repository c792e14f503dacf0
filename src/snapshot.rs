// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Snapshots and change detection.
//!
//! A snapshot is the representation of a record as of its last load or
//! persist. Comparing the live representation against it answers "does
//! this record need syncing?" without touching storage, and gives rebase
//! its common ancestor.
//!
//! ```text
//!   load ──► snapshot = S
//!   mutate ──► current = C
//!   needs_sync = C != S
//!   diff_from_snapshot = diff(C, S)
//!   rebase(incoming I) = merge(I, diff(C, S))
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::GraphError;
use crate::record::{Deletable, Record};
use crate::value::Value;

/// Immutable captured representation. Cheap to clone.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot(Arc<Value>);

impl Snapshot {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(Arc::new(value))
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl AsRef<Value> for Snapshot {
    fn as_ref(&self) -> &Value {
        &self.0
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Snapshot({})", self.0)
    }
}

/// What a rebase did to the resident record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebaseOutcome {
    /// No snapshot to rebase from; the record was left alone.
    Untouched,
    /// No local changes; the incoming state was applied as is.
    FastForward,
    /// Local changes were replayed on top of the incoming state.
    Merged,
    /// Local changes could not be merged and were dropped.
    IncomingWins,
}

impl RebaseOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RebaseOutcome::Untouched => "untouched",
            RebaseOutcome::FastForward => "fast_forward",
            RebaseOutcome::Merged => "merged",
            RebaseOutcome::IncomingWins => "incoming_wins",
        }
    }
}

/// Snapshot operations available on every [`Record`].
pub trait Snapshots: Record {
    /// Capture the current representation without storing it.
    fn make_snapshot(&self) -> Result<Snapshot, GraphError> {
        self.to_value()
            .map(Snapshot::new)
            .map_err(|source| GraphError::Representation { kind: Self::KIND, source })
    }

    /// Capture the current representation as the record's snapshot.
    fn take_snapshot(&mut self) -> Result<(), GraphError> {
        let snapshot = self.make_snapshot()?;
        self.graph_state_mut().set_snapshot(Some(snapshot));
        Ok(())
    }

    fn has_snapshot(&self) -> bool {
        self.graph_state().snapshot().is_some()
    }

    fn snapshot(&self) -> Option<Snapshot> {
        self.graph_state().snapshot().cloned()
    }

    fn remove_snapshot(&mut self) {
        self.graph_state_mut().set_snapshot(None);
    }

    /// Whether the record differs from what storage last saw.
    ///
    /// Always true for records marked deleted or never snapshotted. A
    /// record whose representation cannot be computed also counts as
    /// changed, so the failure surfaces during sync.
    fn needs_sync(&self) -> bool {
        if self.is_marked_deleted() {
            return true;
        }
        match self.graph_state().snapshot() {
            None => true,
            Some(snapshot) => match self.to_value() {
                Ok(current) => &current != snapshot.value(),
                Err(_) => true,
            },
        }
    }

    /// Changes since the snapshot, or `None` with no snapshot or no changes.
    fn diff_from_snapshot(&self) -> Result<Option<Value>, GraphError> {
        let Some(snapshot) = self.graph_state().snapshot() else {
            return Ok(None);
        };
        let current = self
            .to_value()
            .map_err(|source| GraphError::Representation { kind: Self::KIND, source })?;
        Ok(current.diff(snapshot.value()))
    }

    /// Apply `value`, restoring the previous representation if that fails.
    ///
    /// `apply_value` may assign some fields before it errors; the record is
    /// put back as it was and the original error is returned.
    fn apply_or_restore(&mut self, value: &Value) -> Result<(), GraphError> {
        let previous = self
            .to_value()
            .map_err(|source| GraphError::Representation { kind: Self::KIND, source })?;
        if let Err(source) = self.apply_value(value) {
            if let Err(error) = self.apply_value(&previous) {
                warn!(kind = Self::KIND, error = %error, "Could not restore record after failed apply");
            }
            return Err(GraphError::Representation { kind: Self::KIND, source });
        }
        Ok(())
    }

    /// Discard local changes by re-applying the snapshot.
    fn revert_to_snapshot(&mut self) -> Result<(), GraphError> {
        let snapshot = self
            .snapshot()
            .ok_or(GraphError::NoSnapshot { kind: Self::KIND })?;
        self.apply_value(snapshot.value())
            .map_err(|source| GraphError::Representation { kind: Self::KIND, source })
    }

    /// Three-way merge of `incoming` with local changes.
    ///
    /// Local changes are `diff(current, snapshot)`. With none, `incoming`
    /// is applied directly. Otherwise the changes are merged on top of
    /// `incoming`; if that merge fails, `incoming` is applied and the local
    /// changes are lost. When `update_snapshot` is set, the snapshot
    /// becomes `incoming` so later change detection measures against it.
    fn rebase_from(&mut self, incoming: &Value, update_snapshot: bool) -> Result<RebaseOutcome, GraphError> {
        if !self.has_snapshot() {
            return Ok(RebaseOutcome::Untouched);
        }

        let outcome = match self.diff_from_snapshot()? {
            None => {
                self.apply_or_restore(incoming)?;
                RebaseOutcome::FastForward
            }
            Some(local) => match incoming.merge(&local) {
                Some(merged) => {
                    self.apply_or_restore(&merged)?;
                    RebaseOutcome::Merged
                }
                None => {
                    self.apply_or_restore(incoming)?;
                    RebaseOutcome::IncomingWins
                }
            },
        };

        if update_snapshot {
            self.graph_state_mut()
                .set_snapshot(Some(Snapshot::new(incoming.clone())));
        }

        debug!(kind = Self::KIND, outcome = outcome.as_str(), "Rebased record");
        Ok(outcome)
    }
}

impl<R: Record> Snapshots for R {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{GraphState, Identifiable, Representable, Tracked};
    use crate::value::{assign, to_value, ValueError};
    use serde::Serialize;
    use serde_json::json;

    #[derive(Debug, Default, Serialize)]
    struct Note {
        id: Option<u64>,
        title: String,
        pages: i64,
        #[serde(skip)]
        state: GraphState,
    }

    impl Identifiable for Note {
        type Id = u64;
        fn id(&self) -> Option<u64> {
            self.id
        }
        fn set_id(&mut self, id: u64) {
            self.id = Some(id);
        }
    }

    impl Representable for Note {
        fn to_value(&self) -> Result<Value, ValueError> {
            to_value(self)
        }
        fn apply_value(&mut self, value: &Value) -> Result<(), ValueError> {
            assign(&mut self.id, value.get("id"))?;
            assign(&mut self.title, value.get("title"))?;
            assign(&mut self.pages, value.get("pages"))
        }
    }

    impl Tracked for Note {
        fn graph_state(&self) -> &GraphState {
            &self.state
        }
        fn graph_state_mut(&mut self) -> &mut GraphState {
            &mut self.state
        }
    }

    impl Record for Note {
        const KIND: &'static str = "note";
    }

    fn note(title: &str, pages: i64) -> Note {
        Note { id: Some(1), title: title.into(), pages, ..Note::default() }
    }

    #[test]
    fn test_needs_sync_without_snapshot() {
        let note = note("Draft", 1);
        assert!(!note.has_snapshot());
        assert!(note.needs_sync());
    }

    #[test]
    fn test_needs_sync_tracks_changes() {
        let mut note = note("Draft", 1);
        note.take_snapshot().unwrap();
        assert!(!note.needs_sync());

        note.pages = 2;
        assert!(note.needs_sync());

        note.pages = 1;
        assert!(!note.needs_sync());
    }

    #[test]
    fn test_deleted_always_needs_sync() {
        let mut note = note("Draft", 1);
        note.take_snapshot().unwrap();
        note.mark_deleted();
        assert!(note.needs_sync());
    }

    #[test]
    fn test_diff_from_snapshot() {
        let mut note = note("Draft", 1);
        assert_eq!(note.diff_from_snapshot().unwrap(), None);

        note.take_snapshot().unwrap();
        note.title = "Final".into();
        assert_eq!(note.diff_from_snapshot().unwrap(), Some(Value::from(json!({"title": "Final"}))));
    }

    #[test]
    fn test_revert_to_snapshot() {
        let mut note = note("Draft", 1);
        assert!(matches!(note.revert_to_snapshot(), Err(GraphError::NoSnapshot { kind: "note" })));

        note.take_snapshot().unwrap();
        note.title = "Scribbles".into();
        note.pages = 40;
        note.revert_to_snapshot().unwrap();
        assert_eq!(note.title, "Draft");
        assert_eq!(note.pages, 1);
    }

    #[test]
    fn test_remove_snapshot() {
        let mut note = note("Draft", 1);
        note.take_snapshot().unwrap();
        assert!(note.snapshot().is_some());
        note.remove_snapshot();
        assert!(note.snapshot().is_none());
    }

    #[test]
    fn test_rebase_without_snapshot_is_untouched() {
        let mut note = note("Draft", 1);
        let incoming = Value::from(json!({"id": 1, "title": "Remote", "pages": 9}));
        assert_eq!(note.rebase_from(&incoming, true).unwrap(), RebaseOutcome::Untouched);
        assert_eq!(note.title, "Draft");
        assert!(!note.has_snapshot());
    }

    #[test]
    fn test_rebase_fast_forward() {
        let mut note = note("Draft", 1);
        note.take_snapshot().unwrap();

        let incoming = Value::from(json!({"id": 1, "title": "Remote", "pages": 9}));
        assert_eq!(note.rebase_from(&incoming, true).unwrap(), RebaseOutcome::FastForward);
        assert_eq!(note.title, "Remote");
        assert_eq!(note.pages, 9);
        assert!(!note.needs_sync());
    }

    #[test]
    fn test_rebase_merges_local_changes() {
        let mut note = note("Draft", 1);
        note.take_snapshot().unwrap();
        note.pages = 5;

        let incoming = Value::from(json!({"id": 1, "title": "Remote", "pages": 1}));
        assert_eq!(note.rebase_from(&incoming, true).unwrap(), RebaseOutcome::Merged);
        assert_eq!(note.title, "Remote");
        assert_eq!(note.pages, 5);
        assert!(note.needs_sync());
        assert_eq!(note.diff_from_snapshot().unwrap(), Some(Value::from(json!({"pages": 5}))));
    }

    #[test]
    fn test_rebase_keeps_old_snapshot_when_asked() {
        let mut note = note("Draft", 1);
        note.take_snapshot().unwrap();

        let incoming = Value::from(json!({"id": 1, "title": "Remote", "pages": 1}));
        note.rebase_from(&incoming, false).unwrap();
        assert_eq!(
            note.snapshot().unwrap().value().get("title").and_then(Value::as_str),
            Some("Draft")
        );
    }

    #[test]
    fn test_failed_apply_restores_record() {
        let mut note = note("Draft", 1);
        let incoming = Value::from(json!({"id": 1, "title": "Remote", "pages": "many"}));

        let result = note.apply_or_restore(&incoming);
        assert!(matches!(result, Err(GraphError::Representation { kind: "note", .. })));
        assert_eq!(note.title, "Draft");
        assert_eq!(note.pages, 1);
    }

    #[test]
    fn test_failed_rebase_leaves_record_and_snapshot() {
        let mut note = note("Draft", 1);
        note.take_snapshot().unwrap();
        note.pages = 5;

        let incoming = Value::from(json!({"id": 1, "title": "Remote", "pages": "many"}));
        assert!(note.rebase_from(&incoming, true).is_err());
        assert_eq!(note.title, "Draft");
        assert_eq!(note.pages, 5);
        assert_eq!(
            note.snapshot().unwrap().value().get("title").and_then(Value::as_str),
            Some("Draft")
        );
    }

    #[test]
    fn test_snapshot_debug_shows_value() {
        let snapshot = Snapshot::new(Value::from(json!({"a": 1})));
        assert_eq!(format!("{snapshot:?}"), r#"Snapshot({"a":1})"#);
    }
}
