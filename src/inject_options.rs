// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Options for caller-controlled duplicate handling.
//!
//! Injecting a record whose identifier is already resident under a
//! different instance is a conflict. The caller decides how it resolves;
//! the graph only applies the choice.
//!
//! # Example
//!
//! ```rust
//! use record_graph::{DuplicateResolution, InjectOptions};
//!
//! // Default: graph's configured resolution and snapshot policy
//! let opts = InjectOptions::default();
//! assert!(opts.resolution.is_none());
//!
//! // Fresh rows from storage: overwrite in place and snapshot
//! let opts = InjectOptions::deserialize().with_snapshot(true);
//! assert_eq!(opts.resolution, Some(DuplicateResolution::Deserialize));
//! ```

use std::fmt;

use serde::Deserialize;

/// How to resolve an injection that collides with a resident record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateResolution {
    /// Replay the resident record's unsaved changes on top of the incoming
    /// state. Incompatible changes are dropped in favor of incoming. If the
    /// result cannot be applied, the resident record is restored.
    #[default]
    Rebase,
    /// Overwrite the resident record's fields with the incoming state.
    ///
    /// If applying fails partway, the resident record is restored to its
    /// prior representation and the error is returned.
    Deserialize,
    /// Ignore the incoming record.
    KeepExisting,
    /// Make the incoming record resident; the old instance is detached.
    ReplaceReference,
}

impl DuplicateResolution {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DuplicateResolution::Rebase => "rebase",
            DuplicateResolution::Deserialize => "deserialize",
            DuplicateResolution::KeepExisting => "keep_existing",
            DuplicateResolution::ReplaceReference => "replace_reference",
        }
    }
}

impl fmt::Display for DuplicateResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for a single injection.
///
/// `None` fields fall back to the graph's [`crate::GraphConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectOptions {
    /// Duplicate resolution policy.
    ///
    /// Default: `None` (use `GraphConfig::default_resolution`)
    pub resolution: Option<DuplicateResolution>,

    /// Whether to snapshot the resident record after injection.
    ///
    /// Default: `None` (use `GraphConfig::snapshot_policy`)
    pub take_snapshot: Option<bool>,
}

impl InjectOptions {
    #[must_use]
    pub fn rebase() -> Self {
        Self::default().with_resolution(DuplicateResolution::Rebase)
    }

    #[must_use]
    pub fn deserialize() -> Self {
        Self::default().with_resolution(DuplicateResolution::Deserialize)
    }

    #[must_use]
    pub fn keep_existing() -> Self {
        Self::default().with_resolution(DuplicateResolution::KeepExisting)
    }

    #[must_use]
    pub fn replace_reference() -> Self {
        Self::default().with_resolution(DuplicateResolution::ReplaceReference)
    }

    /// Set the resolution policy (builder pattern).
    #[must_use]
    pub fn with_resolution(mut self, resolution: DuplicateResolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Force snapshotting on or off (builder pattern).
    #[must_use]
    pub fn with_snapshot(mut self, take_snapshot: bool) -> Self {
        self.take_snapshot = Some(take_snapshot);
        self
    }
}

impl From<DuplicateResolution> for InjectOptions {
    fn from(resolution: DuplicateResolution) -> Self {
        Self::default().with_resolution(resolution)
    }
}
