use crate::models::method::Method;
use crate::models::params::ParamMap;
use crate::models::response::RenderedResponse;
use crate::utils::pattern::{PatternError, RoutePattern};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by route registration.
///
/// All of these are reported before serving begins (or, for late
/// registration, before the route becomes visible); none of them can occur
/// on the dispatch path.
#[derive(Error, Debug, PartialEq)]
pub enum RegistrationError {
    /// A static entry already exists for this (method, path). Overwriting
    /// is forbidden so the pre-rendered contract stays predictable.
    #[error("Static route already registered: {method} {path}")]
    DuplicateStatic {
        /// Method of the existing entry
        method: Method,
        /// Path of the existing entry
        path: String,
    },

    /// A dynamic entry already exists for this (method, pattern). Cache
    /// entries borrow their TTL through the owning route, so route policy
    /// must stay immutable once registered.
    #[error("Dynamic route already registered: {method} {pattern}")]
    DuplicatePattern {
        /// Method of the existing entry
        method: Method,
        /// Pattern of the existing entry
        pattern: String,
    },

    /// The pattern failed validation or compilation.
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// A registered dynamic route: compiled pattern, diagnostics name, and
/// cache policy.
///
/// The handler name is carried for diagnostics only; invocation always
/// goes through the process-wide bridge slot, not through a per-route
/// callable.
#[derive(Debug)]
pub struct DynamicRoute {
    /// Compiled matcher for the registered pattern.
    pub pattern: RoutePattern,
    /// Host-side handler name, for logs and stats.
    pub handler_name: String,
    /// Response-cache TTL in seconds; 0 disables caching for this route.
    pub ttl_seconds: u64,
}

impl DynamicRoute {
    /// True when responses from this route may enter the cache.
    pub fn cacheable(&self) -> bool {
        self.ttl_seconds > 0
    }
}

type StaticMap = DashMap<String, Arc<RenderedResponse>, ahash::RandomState>;
type DynamicSnapshot = Arc<Vec<Arc<DynamicRoute>>>;

/// Concurrent route populations for the three-tier dispatcher.
///
/// Two populations live here:
///
/// - **Static**: pre-rendered responses in a sharded concurrent map keyed
///   by exact (method, path). First write wins; reads never block.
/// - **Dynamic**: per-method copy-on-write snapshots. Registration clones
///   the current vector, appends, and swaps the pointer atomically;
///   readers load the snapshot and scan it without synchronization.
///   Registration order is preserved and is the match tiebreaker. The
///   engine deliberately does not rank by specificity, because ordering is
///   the contract exposed to the host.
///
/// Registration after serving has begun is permitted and becomes visible
/// on the next dispatch that loads the snapshot.
#[derive(Debug)]
pub struct RouteTable {
    /// Static entries, one map per method so probes borrow the path
    /// without building a composite key.
    statics: [StaticMap; Method::COUNT],
    dynamics: [ArcSwap<Vec<Arc<DynamicRoute>>>; Method::COUNT],
    /// Serializes dynamic writers; the read path never touches it.
    write_lock: Mutex<()>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    pub fn new() -> Self {
        Self {
            statics: std::array::from_fn(|_| DashMap::with_hasher(ahash::RandomState::new())),
            dynamics: std::array::from_fn(|_| ArcSwap::from_pointee(Vec::new())),
            write_lock: Mutex::new(()),
        }
    }

    /// Inserts a pre-rendered static entry.
    ///
    /// Fails with [`RegistrationError::DuplicateStatic`] if the key is
    /// already present; the existing entry is left unchanged.
    pub fn register_static(
        &self,
        method: Method,
        path: &str,
        response: RenderedResponse,
    ) -> Result<(), RegistrationError> {
        use dashmap::mapref::entry::Entry;
        match self.statics[method.index()].entry(path.to_string()) {
            Entry::Occupied(_) => Err(RegistrationError::DuplicateStatic {
                method,
                path: path.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(response));
                Ok(())
            }
        }
    }

    /// Compiles and inserts a dynamic entry under its method.
    ///
    /// The pattern is validated up front; a malformed pattern never makes
    /// it into a snapshot. Re-registering an existing (method, pattern)
    /// fails with [`RegistrationError::DuplicatePattern`].
    pub fn register_dynamic(
        &self,
        method: Method,
        pattern: &str,
        handler_name: &str,
        ttl_seconds: u64,
    ) -> Result<(), RegistrationError> {
        let compiled = RoutePattern::compile(pattern)?;
        let route = Arc::new(DynamicRoute {
            pattern: compiled,
            handler_name: handler_name.to_string(),
            ttl_seconds,
        });

        // Poisoning here means a writer panicked mid-swap; treat as fatal.
        let guard = self.write_lock.lock().unwrap();

        let slot = &self.dynamics[method.index()];
        let current = slot.load_full();
        if current.iter().any(|r| r.pattern.raw() == pattern) {
            return Err(RegistrationError::DuplicatePattern {
                method,
                pattern: pattern.to_string(),
            });
        }

        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(route);
        slot.store(Arc::new(next));

        drop(guard);
        Ok(())
    }

    /// Exact-key probe of the static population. O(1), no allocation.
    pub fn lookup_static(&self, method: Method, path: &str) -> Option<Arc<RenderedResponse>> {
        self.statics[method.index()]
            .get(path)
            .map(|entry| entry.value().clone())
    }

    /// Scans the method's dynamic snapshot in registration order and
    /// returns the first end-to-end match with its parameter bindings.
    pub fn match_dynamic(
        &self,
        method: Method,
        path: &str,
    ) -> Option<(Arc<DynamicRoute>, ParamMap)> {
        let snapshot: DynamicSnapshot = self.dynamics[method.index()].load_full();
        for route in snapshot.iter() {
            if let Some(params) = route.pattern.capture(path) {
                return Some((route.clone(), params));
            }
        }
        None
    }

    /// Number of static entries across all methods.
    pub fn static_len(&self) -> usize {
        self.statics.iter().map(|map| map.len()).sum()
    }

    /// Number of dynamic entries across all methods.
    pub fn dynamic_len(&self) -> usize {
        self.dynamics
            .iter()
            .map(|slot| slot.load().len())
            .sum()
    }
}
