//! Metrics registry for range operations
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe, relaxed atomics

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for range building and merging
///
/// A registry is usually owned by a planner and shared by reference with
/// the merge layer.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Ranges inserted into trees
    ranges_inserted: AtomicU64,
    /// Ranges removed from trees
    ranges_removed: AtomicU64,
    /// Connection searches run
    connection_queries: AtomicU64,
    /// Stored ranges split around an overlapping range
    overlaps_split: AtomicU64,
    /// Trees flattened into collections
    collections_flattened: AtomicU64,
    /// Ranges emitted by flattening
    ranges_emitted: AtomicU64,
    /// Input ranges absorbed by merging
    ranges_merged: AtomicU64,
    /// Logically empty input ranges dropped from results
    empty_ranges_discarded: AtomicU64,
    /// Filters planned
    plans_completed: AtomicU64,
    /// Filters rejected
    plans_rejected: AtomicU64,
    /// Comparison failures surfaced to callers
    compare_failures: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Add inserted ranges
    pub fn add_ranges_inserted(&self, count: u64) {
        self.ranges_inserted.fetch_add(count, Ordering::Relaxed);
    }

    /// Add removed ranges
    pub fn add_ranges_removed(&self, count: u64) {
        self.ranges_removed.fetch_add(count, Ordering::Relaxed);
    }

    /// Increment connection searches
    pub fn increment_connection_queries(&self) {
        self.connection_queries.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment overlap splits
    pub fn increment_overlaps_split(&self) {
        self.overlaps_split.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one flattening that produced `emitted` ranges from `input`
    /// ranges
    pub fn record_flatten(&self, input: u64, emitted: u64) {
        self.collections_flattened.fetch_add(1, Ordering::Relaxed);
        self.ranges_emitted.fetch_add(emitted, Ordering::Relaxed);
        self.ranges_merged
            .fetch_add(input.saturating_sub(emitted), Ordering::Relaxed);
    }

    /// Add discarded empty ranges
    pub fn add_empty_ranges_discarded(&self, count: u64) {
        self.empty_ranges_discarded.fetch_add(count, Ordering::Relaxed);
    }

    /// Increment completed plans
    pub fn increment_plans_completed(&self) {
        self.plans_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment rejected plans
    pub fn increment_plans_rejected(&self) {
        self.plans_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment comparison failures
    pub fn increment_compare_failures(&self) {
        self.compare_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ranges_inserted: self.ranges_inserted.load(Ordering::Relaxed),
            ranges_removed: self.ranges_removed.load(Ordering::Relaxed),
            connection_queries: self.connection_queries.load(Ordering::Relaxed),
            overlaps_split: self.overlaps_split.load(Ordering::Relaxed),
            collections_flattened: self.collections_flattened.load(Ordering::Relaxed),
            ranges_emitted: self.ranges_emitted.load(Ordering::Relaxed),
            ranges_merged: self.ranges_merged.load(Ordering::Relaxed),
            empty_ranges_discarded: self.empty_ranges_discarded.load(Ordering::Relaxed),
            plans_completed: self.plans_completed.load(Ordering::Relaxed),
            plans_rejected: self.plans_rejected.load(Ordering::Relaxed),
            compare_failures: self.compare_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub ranges_inserted: u64,
    pub ranges_removed: u64,
    pub connection_queries: u64,
    pub overlaps_split: u64,
    pub collections_flattened: u64,
    pub ranges_emitted: u64,
    pub ranges_merged: u64,
    pub empty_ranges_discarded: u64,
    pub plans_completed: u64,
    pub plans_rejected: u64,
    pub compare_failures: u64,
}
