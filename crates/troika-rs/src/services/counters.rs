use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Thread-safe dispatch-outcome counters.
///
/// One tier counter is incremented per dispatch (`static_hits`,
/// `cached_hits`, `dynamic_hits` or `not_found`) and `total_requests`
/// increments exactly once alongside it. `cache_misses` and
/// `handler_errors` are auxiliary tallies layered on top of a dynamic-tier
/// outcome, never a tier of their own.
///
/// # Thread Safety
///
/// All counters use relaxed atomic operations for lock-free updates from
/// worker tasks. Snapshots read each counter independently; a snapshot
/// taken under concurrent load is internally consistent per counter, not
/// across counters.
#[derive(Debug)]
pub struct TierCounters {
    total_requests: AtomicU64,
    static_hits: AtomicU64,
    cached_hits: AtomicU64,
    dynamic_hits: AtomicU64,
    cache_misses: AtomicU64,
    not_found: AtomicU64,
    handler_errors: AtomicU64,
    /// Engine start time for uptime reporting.
    start_time: Instant,
}

/// Point-in-time view of the counters, suitable for JSON serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub total_requests: u64,
    pub static_hits: u64,
    pub cached_hits: u64,
    pub dynamic_hits: u64,
    pub cache_misses: u64,
    pub not_found: u64,
    pub handler_errors: u64,
    pub uptime_seconds: u64,
}

impl Default for TierCounters {
    fn default() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            static_hits: AtomicU64::new(0),
            cached_hits: AtomicU64::new(0),
            dynamic_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            not_found: AtomicU64::new(0),
            handler_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }
}

impl TierCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a static-table hit.
    pub fn record_static_hit(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.static_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a fresh response served from the cache tier.
    pub fn record_cached_hit(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.cached_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a dispatch that reached the dynamic tier.
    pub fn record_dynamic_hit(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.dynamic_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a request that matched no tier.
    pub fn record_not_found(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a cacheable route served dynamically after a failed probe.
    /// Does not touch `total_requests`.
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a handler-side failure (panic, malformed reply, missing
    /// bridge). Does not touch `total_requests`.
    pub fn record_handler_error(&self) {
        self.handler_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads every counter with relaxed ordering and returns the record.
    ///
    /// Idempotent: reading never perturbs the counters.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            static_hits: self.static_hits.load(Ordering::Relaxed),
            cached_hits: self.cached_hits.load(Ordering::Relaxed),
            dynamic_hits: self.dynamic_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            handler_errors: self.handler_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Stores zero into every counter.
    ///
    /// No snapshot-then-reset atomicity is provided; callers needing exact
    /// deltas under load must compute them from successive snapshots.
    pub fn reset(&self) {
        self.total_requests.store(0, Ordering::Relaxed);
        self.static_hits.store(0, Ordering::Relaxed);
        self.cached_hits.store(0, Ordering::Relaxed);
        self.dynamic_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
        self.not_found.store(0, Ordering::Relaxed);
        self.handler_errors.store(0, Ordering::Relaxed);
    }
}
