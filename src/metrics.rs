//! Engine metrics
//!
//! Lock-free counters for the governance pipeline and the purge cycle,
//! read by operational tooling alongside the policy accessors.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters updated by the engine and purge scheduler
#[derive(Debug, Default)]
pub struct EngineMetrics {
    submitted: AtomicU64,
    admitted: AtomicU64,
    dropped: AtomicU64,
    escalated: AtomicU64,
    append_errors: AtomicU64,
    purge_cycles: AtomicU64,
    purge_failures: AtomicU64,
    purged_entries: AtomicU64,
}

impl EngineMetrics {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_escalated(&self) {
        self.escalated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_append_error(&self) {
        self.append_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_purge_cycle(&self, deleted: usize) {
        self.purge_cycles.fetch_add(1, Ordering::Relaxed);
        self.purged_entries
            .fetch_add(deleted as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_purge_failure(&self) {
        self.purge_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.submitted.load(Ordering::Relaxed),
            admitted: self.admitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            escalated: self.escalated.load(Ordering::Relaxed),
            append_errors: self.append_errors.load(Ordering::Relaxed),
            purge_cycles: self.purge_cycles.load(Ordering::Relaxed),
            purge_failures: self.purge_failures.load(Ordering::Relaxed),
            purged_entries: self.purged_entries.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.submitted.store(0, Ordering::Relaxed);
        self.admitted.store(0, Ordering::Relaxed);
        self.dropped.store(0, Ordering::Relaxed);
        self.escalated.store(0, Ordering::Relaxed);
        self.append_errors.store(0, Ordering::Relaxed);
        self.purge_cycles.store(0, Ordering::Relaxed);
        self.purge_failures.store(0, Ordering::Relaxed);
        self.purged_entries.store(0, Ordering::Relaxed);
    }
}

/// Serializable snapshot of the engine counters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Candidate events handed to the pipeline
    pub submitted: u64,
    /// Entries persisted
    pub admitted: u64,
    /// Candidates rejected by the admission filter
    pub dropped: u64,
    /// Candidates whose level was raised by performance classification
    pub escalated: u64,
    /// Failed append attempts
    pub append_errors: u64,
    /// Completed purge cycles
    pub purge_cycles: u64,
    /// Purge cycles that failed or exceeded their budget
    pub purge_failures: u64,
    /// Entries removed by purging
    pub purged_entries: u64,
}
