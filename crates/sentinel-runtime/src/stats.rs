//! Pipeline counters
//!
//! Lock-free counters updated by every stage and summarized into a
//! [`PipelineReport`] when the pipeline stops.

use std::sync::atomic::{AtomicU64, Ordering};

/// Relaxed monotonic counter
#[derive(Debug, Default)]
struct Counter(AtomicU64);

impl Counter {
    fn bump(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Shared counters for one pipeline instance
#[derive(Debug, Default)]
pub struct PipelineStats {
    fragments_accepted: Counter,
    late_fragments: Counter,
    snapshots_resolved: Counter,
    snapshots_unresolved: Counter,
    results_delivered: Counter,
    duplicates_dropped: Counter,
    delivery_failures: Counter,
    incomplete_reports: Counter,
}

impl PipelineStats {
    pub fn record_fragment(&self) {
        self.fragments_accepted.bump();
    }

    pub fn record_late_fragment(&self) {
        self.late_fragments.bump();
    }

    pub fn record_resolution(&self, resolved: bool) {
        if resolved {
            self.snapshots_resolved.bump();
        } else {
            self.snapshots_unresolved.bump();
        }
    }

    pub fn record_delivery(&self) {
        self.results_delivered.bump();
    }

    pub fn record_duplicate(&self) {
        self.duplicates_dropped.bump();
    }

    pub fn record_delivery_failure(&self) {
        self.delivery_failures.bump();
    }

    pub fn record_incomplete(&self) {
        self.incomplete_reports.bump();
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            fragments_accepted: self.fragments_accepted.get(),
            late_fragments: self.late_fragments.get(),
            snapshots_resolved: self.snapshots_resolved.get(),
            snapshots_unresolved: self.snapshots_unresolved.get(),
            results_delivered: self.results_delivered.get(),
            duplicates_dropped: self.duplicates_dropped.get(),
            delivery_failures: self.delivery_failures.get(),
            incomplete_reports: self.incomplete_reports.get(),
        }
    }
}

/// Plain copy of [`PipelineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub fragments_accepted: u64,
    pub late_fragments: u64,
    pub snapshots_resolved: u64,
    pub snapshots_unresolved: u64,
    pub results_delivered: u64,
    pub duplicates_dropped: u64,
    pub delivery_failures: u64,
    pub incomplete_reports: u64,
}

/// Summary returned by `SentinelPipeline::stop`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Distinct groups observed during the run
    pub groups_seen: usize,
    /// Groups with at least one delivered result
    pub groups_delivered: usize,
    /// Receiver-drain threads that ran
    pub receivers: usize,
    /// Compute workers that ran
    pub compute_workers: usize,
    /// Send workers that ran
    pub transmitters: usize,
    pub stats: StatsSnapshot,
}

impl PipelineReport {
    /// Groups that were reported incomplete (counted once, not per transmitter)
    pub fn groups_incomplete(&self) -> usize {
        self.groups_seen.saturating_sub(self.groups_delivered)
    }
}
