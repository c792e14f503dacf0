// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the record graph.
//!
//! # Example
//!
//! ```
//! use record_graph::{DuplicateResolution, GraphConfig, SyncErrorPolicy};
//!
//! // Minimal config (uses defaults)
//! let config = GraphConfig::default();
//! assert_eq!(config.default_resolution, DuplicateResolution::Rebase);
//! assert!(config.sync_order.is_empty());
//!
//! // Parents before children, stop at the first failure
//! let config = GraphConfig {
//!     sync_order: vec!["person".into(), "car".into()],
//!     sync_error_policy: SyncErrorPolicy::Abort,
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;

use crate::inject_options::DuplicateResolution;

/// Configuration for a [`crate::Graph`].
///
/// Deserializable so it can live in an application's config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GraphConfig {
    /// Kinds synced first, in this order. Kinds not listed follow in
    /// lexicographic order.
    #[serde(default)]
    pub sync_order: Vec<String>,

    /// Policy used when an injection does not name one (default: rebase)
    #[serde(default)]
    pub default_resolution: DuplicateResolution,

    /// Whether injected records get a snapshot when the caller does not say
    #[serde(default)]
    pub snapshot_policy: SnapshotPolicy,

    /// What a sync pass does after a record fails (default: continue)
    #[serde(default)]
    pub sync_error_policy: SyncErrorPolicy,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            sync_order: Vec::new(),
            default_resolution: DuplicateResolution::default(),
            snapshot_policy: SnapshotPolicy::default(),
            sync_error_policy: SyncErrorPolicy::default(),
        }
    }
}

/// Default for `InjectOptions::take_snapshot`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotPolicy {
    /// Snapshot records known to exist in storage.
    #[default]
    WhenPersisted,
    Always,
    Never,
}

impl SnapshotPolicy {
    #[must_use]
    pub fn resolve(self, exists_in_storage: bool) -> bool {
        match self {
            SnapshotPolicy::WhenPersisted => exists_in_storage,
            SnapshotPolicy::Always => true,
            SnapshotPolicy::Never => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncErrorPolicy {
    /// Attempt every record and report every failure.
    #[default]
    Continue,
    /// Stop at the first failure.
    Abort,
}
