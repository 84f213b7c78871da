//! Counters for observing cache behavior.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic operation counters, shared across cloned cache handles.
#[derive(Default)]
pub struct CacheMetrics {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub inserts: AtomicU64,
    pub removes: AtomicU64,
    pub evictions: AtomicU64,
    pub rehydrated: AtomicU64,
    pub pruned: AtomicU64,
    pub decode_failures: AtomicU64,
    pub store_errors: AtomicU64,
}

impl CacheMetrics {
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self, resident_entries: u64, resident_bytes: u64) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            rehydrated: self.rehydrated.load(Ordering::Relaxed),
            pruned: self.pruned.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            resident_entries,
            resident_bytes,
        }
    }
}

/// Point-in-time view of the counters plus residency gauges.
#[derive(Debug, Clone, Copy)]
pub struct CacheMetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub removes: u64,
    pub evictions: u64,
    /// Entries loaded into the index at the last open.
    pub rehydrated: u64,
    /// Over-budget rows deleted from the store at the last open.
    pub pruned: u64,
    pub decode_failures: u64,
    pub store_errors: u64,
    pub resident_entries: u64,
    pub resident_bytes: u64,
}
