// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the record graph.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding application chooses the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `record_graph_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `kind`: record kind name
//! - `operation`: persist, delete
//! - `status`: success, error, unavailable, aborted
//! - `outcome`: what an injection or rebase did

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Record an injection and how it was resolved
pub fn record_injection(kind: &str, outcome: &str) {
    counter!(
        "record_graph_injections_total",
        "kind" => kind.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a rebase of a resident record
pub fn record_rebase(kind: &str, outcome: &str) {
    counter!(
        "record_graph_rebases_total",
        "kind" => kind.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a single adapter call made during sync
pub fn record_sync_operation(kind: &str, operation: &str, status: &str) {
    counter!(
        "record_graph_sync_operations_total",
        "kind" => kind.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a whole sync pass
pub fn record_sync_pass(status: &str) {
    counter!(
        "record_graph_sync_passes_total",
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record sync pass latency
pub fn record_sync_duration(duration: Duration) {
    histogram!("record_graph_sync_seconds").record(duration.as_secs_f64());
}

/// Record where a lookup was answered from (resident, storage, miss)
pub fn record_lookup(kind: &str, source: &str) {
    counter!(
        "record_graph_lookups_total",
        "kind" => kind.to_string(),
        "source" => source.to_string()
    )
    .increment(1);
}

/// Set the number of resident records of a kind
pub fn set_resident_records(kind: &str, count: usize) {
    gauge!(
        "record_graph_resident_records",
        "kind" => kind.to_string()
    )
    .set(count as f64);
}

/// Timer that records sync pass duration on drop
pub struct SyncTimer {
    start: Instant,
}

impl SyncTimer {
    /// Start a new sync timer
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SyncTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SyncTimer {
    fn drop(&mut self) {
        record_sync_duration(self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    // These verify the API doesn't panic without a recorder installed.

    #[test]
    fn test_record_injection() {
        record_injection("person", "inserted");
        record_injection("person", "keep_existing");
    }

    #[test]
    fn test_record_sync() {
        record_sync_operation("person", "persist", "success");
        record_sync_operation("car", "delete", "error");
        record_sync_pass("success");
        record_sync_duration(Duration::from_millis(5));
    }

    #[test]
    fn test_gauges() {
        set_resident_records("person", 42);
        record_lookup("person", "storage");
    }

    #[test]
    fn test_counters_reach_recorder() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_rebase("person", "merged");
            record_rebase("person", "merged");
            let _timer = SyncTimer::new();
        });

        let entries = snapshotter.snapshot().into_vec();
        let rebases = entries
            .iter()
            .find(|(key, _, _, _)| key.key().name() == "record_graph_rebases_total")
            .map(|(_, _, _, value)| value);
        assert_eq!(rebases, Some(&DebugValue::Counter(2)));

        let timed = entries
            .iter()
            .any(|(key, _, _, _)| key.key().name() == "record_graph_sync_seconds");
        assert!(timed);
    }
}
