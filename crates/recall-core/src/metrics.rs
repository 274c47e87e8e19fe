//! Global atomic counters for Recall observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. after each sweep).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, no allocations and no locking.
pub struct Metrics {
    memories_stored: AtomicU64,
    entries_evicted: AtomicU64,
    eviction_failures: AtomicU64,
    sweeps_completed: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            memories_stored: AtomicU64::new(0),
            entries_evicted: AtomicU64::new(0),
            eviction_failures: AtomicU64::new(0),
            sweeps_completed: AtomicU64::new(0),
        }
    }

    pub fn inc_memories_stored(&self) {
        self.memories_stored.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "memories_stored", "counter incremented");
    }

    /// Add `n` to the evicted-entries counter.
    pub fn add_entries_evicted(&self, n: u64) {
        self.entries_evicted.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "entries_evicted", n, "counter incremented");
    }

    pub fn inc_eviction_failures(&self) {
        self.eviction_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "eviction_failures", "counter incremented");
    }

    pub fn inc_sweeps(&self) {
        self.sweeps_completed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "sweeps_completed", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call this at natural boundaries (end of a sweep, CLI exit)
    /// rather than on every increment.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            memories_stored = self.memories_stored(),
            entries_evicted = self.entries_evicted(),
            eviction_failures = self.eviction_failures(),
            sweeps_completed = self.sweeps_completed(),
        );
    }

    pub fn memories_stored(&self) -> u64 {
        self.memories_stored.load(Ordering::Relaxed)
    }

    pub fn entries_evicted(&self) -> u64 {
        self.entries_evicted.load(Ordering::Relaxed)
    }

    pub fn eviction_failures(&self) -> u64 {
        self.eviction_failures.load(Ordering::Relaxed)
    }

    pub fn sweeps_completed(&self) -> u64 {
        self.sweeps_completed.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.memories_stored.store(0, Ordering::Relaxed);
        self.entries_evicted.store(0, Ordering::Relaxed);
        self.eviction_failures.store(0, Ordering::Relaxed);
        self.sweeps_completed.store(0, Ordering::Relaxed);
    }
}
