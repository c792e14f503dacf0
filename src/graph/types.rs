//! Public types for the record graph.

use std::ops::AddAssign;

/// Boxed error returned by delegate hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result of a sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records written through their adapter
    pub persisted: usize,
    /// Records deleted from storage and removed from the graph
    pub deleted: usize,
    /// Records that did not need syncing
    pub skipped: usize,
}

impl SyncReport {
    /// Records visited, whatever happened to them.
    #[must_use]
    pub fn total(&self) -> usize {
        self.persisted + self.deleted + self.skipped
    }

    /// Records that reached storage.
    #[must_use]
    pub fn written(&self) -> usize {
        self.persisted + self.deleted
    }
}

impl AddAssign for SyncReport {
    fn add_assign(&mut self, other: Self) {
        self.persisted += other.persisted;
        self.deleted += other.deleted;
        self.skipped += other.skipped;
    }
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "persisted={}, deleted={}, skipped={}",
            self.persisted, self.deleted, self.skipped
        )
    }
}

/// Hooks around a graph-wide sync.
///
/// Both hooks default to doing nothing.
pub trait SyncDelegate: Send + Sync {
    /// Called before anything is written. Returning an error aborts the
    /// sync with [`crate::GraphError::SyncAborted`].
    fn before_sync(&self, forced: bool) -> Result<(), BoxError> {
        let _ = forced;
        Ok(())
    }

    /// Called after a sync pass in which every record succeeded.
    fn after_sync(&self) {}
}

/// What an injection did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InjectOutcome {
    Inserted,
    AlreadyResident,
    KeptExisting,
    Deserialized,
    Rebased,
    Replaced,
}

impl InjectOutcome {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::AlreadyResident => "already_resident",
            Self::KeptExisting => "keep_existing",
            Self::Deserialized => "deserialize",
            Self::Rebased => "rebase",
            Self::Replaced => "replace_reference",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_accumulates() {
        let mut report = SyncReport { persisted: 1, deleted: 0, skipped: 2 };
        report += SyncReport { persisted: 3, deleted: 1, skipped: 0 };
        assert_eq!(report, SyncReport { persisted: 4, deleted: 1, skipped: 2 });
        assert_eq!(report.total(), 7);
        assert_eq!(report.written(), 5);
        assert_eq!(report.to_string(), "persisted=4, deleted=1, skipped=2");
    }

    struct Silent;
    impl SyncDelegate for Silent {}

    #[test]
    fn test_delegate_defaults() {
        assert!(Silent.before_sync(true).is_ok());
        Silent.after_sync();
    }
}
