//! TTL-bounded response cache for the middle dispatch tier.
//!
//! Entries are keyed by `method + "\0" + path`. The query string is
//! deliberately not part of the key: the path up to `?` is the cache
//! identity, preserving the behavior of the system this engine replaces.
//! A canonicalized-query extension would only need to change
//! [`cache_key`].
//!
//! Expiration is lazy: entries are checked on lookup and removed when
//! stale. No background sweeper runs. An optional capacity bound evicts
//! the oldest entry (by creation stamp) on insert.

use crate::models::method::Method;
use crate::models::response::RenderedResponse;
use crate::services::route_table::DynamicRoute;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Builds the canonical cache key for a request.
pub fn cache_key(method: Method, path: &str) -> String {
    let mut key = String::with_capacity(method.as_str().len() + 1 + path.len());
    key.push_str(method.as_str());
    key.push('\0');
    key.push_str(path);
    key
}

/// One cached rendered response.
///
/// The entry keeps a reference to the dynamic route that produced it, so
/// expiry reads the TTL through the route at O(1) instead of probing the
/// route table again. Routes are immutable once registered, which makes
/// the borrowed policy always current.
#[derive(Debug, Clone)]
struct CacheEntry {
    response: Arc<RenderedResponse>,
    route: Arc<DynamicRoute>,
    created: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created)
            <= Duration::from_secs(self.route.ttl_seconds)
    }
}

/// Concurrent response cache with lazy TTL eviction.
///
/// # Concurrency
///
/// Backed by a sharded concurrent map: lookups and inserts from worker
/// tasks proceed without a global lock. Concurrent inserts under one key
/// are last-writer-wins; the competing entries are semantically
/// equivalent modulo their creation stamp. Readers observe the old entry,
/// the new entry, or a miss; never a torn one.
#[derive(Debug)]
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry, ahash::RandomState>,
    capacity: Option<usize>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache {
    /// Creates an unbounded cache.
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(ahash::RandomState::new()),
            capacity: None,
        }
    }

    /// Creates a cache that holds at most `max_entries` entries, evicting
    /// oldest-first when full.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: DashMap::with_hasher(ahash::RandomState::new()),
            capacity: Some(max_entries),
        }
    }

    /// Probes the cache.
    ///
    /// Returns the rendered response when an entry exists and its age is
    /// within the owning route's TTL. A stale entry is removed on the way
    /// out (best-effort: losing the race to a concurrent remover or
    /// writer is fine) and reported as a miss.
    pub fn lookup(&self, key: &str) -> Option<Arc<RenderedResponse>> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if entry.is_fresh(now) {
                return Some(entry.response.clone());
            }
        }
        // Stale: drop the read guard above before mutating the shard.
        self.entries.remove(key);
        None
    }

    /// Stores a rendered response under `key`, stamped now.
    ///
    /// Callers only insert after a successful dynamic dispatch of a route
    /// with TTL > 0; the cache itself does not re-check the policy.
    pub fn insert(
        &self,
        key: String,
        response: Arc<RenderedResponse>,
        route: Arc<DynamicRoute>,
    ) {
        if let Some(max) = self.capacity {
            if self.entries.len() >= max && !self.entries.contains_key(&key) {
                self.evict_oldest();
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                response,
                route,
                created: Instant::now(),
            },
        );
    }

    /// Atomically empties the cache. In-flight lookups observe either the
    /// old state or the empty state.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Current number of entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes expired entries, then the oldest remaining one if the map
    /// is still at capacity.
    fn evict_oldest(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.is_fresh(now));

        if let Some(max) = self.capacity {
            if self.entries.len() < max {
                return;
            }
        }

        let oldest_key = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().created)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest_key {
            self.entries.remove(&key);
        }
    }

    /// Back-dates an entry's creation stamp, for expiry tests that must
    /// not sleep.
    #[cfg(test)]
    fn backdate(&self, key: &str, age: Duration) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.created = Instant::now() - age;
        }
    }
}
