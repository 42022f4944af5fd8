//! Diagnostic counters
//!
//! Process-lifetime monotonic counters. Diagnostic only: logged at service
//! finish and inspected by tests, never part of the trace output itself.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters maintained by the tracer over its lifetime.
#[derive(Debug, Default)]
pub struct TraceStats {
    records_seen: AtomicU64,
    records_flushed: AtomicU64,
    flushes: AtomicU64,
    correlations_stored: AtomicU64,
    correlations_found: AtomicU64,
    correlations_missed: AtomicU64,
}

/// A point-in-time copy of all counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub records_seen: u64,
    pub records_flushed: u64,
    pub flushes: u64,
    pub correlations_stored: u64,
    pub correlations_found: u64,
    pub correlations_missed: u64,
}

impl TraceStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_records_seen(&self, n: u64) {
        self.records_seen.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_records_flushed(&self, n: u64) {
        self.records_flushed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn flush_done(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn correlation_stored(&self) {
        self.correlations_stored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn correlation_found(&self) {
        self.correlations_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn correlation_missed(&self) {
        self.correlations_missed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            records_seen: self.records_seen.load(Ordering::Relaxed),
            records_flushed: self.records_flushed.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            correlations_stored: self.correlations_stored.load(Ordering::Relaxed),
            correlations_found: self.correlations_found.load(Ordering::Relaxed),
            correlations_missed: self.correlations_missed.load(Ordering::Relaxed),
        }
    }
}
