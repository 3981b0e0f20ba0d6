//! The dispatch engine: route tables, response cache, counters and the
//! handler bridge behind one constructed value.
//!
//! The engine is an explicit value rather than a set of module globals:
//! embedders build one at startup, share it behind `Arc`, and hand it to
//! the server. The only process-wide state in the system lives in the FFI
//! layer, which the C ABI forces to hold a singleton handle.

use crate::models::method::Method;
use crate::models::response::RenderedResponse;
use crate::services::bridge::{BridgeError, Handler, HandlerBridge};
use crate::services::cache::{cache_key, ResponseCache};
use crate::services::counters::{CounterSnapshot, TierCounters};
use crate::services::route_table::{RegistrationError, RouteTable};
use log::{debug, warn};
use serde_json::json;
use std::sync::Arc;

/// The three-tier request dispatcher.
///
/// Classification order is fixed: static table, then cache, then dynamic
/// match, then 404. Every dispatch increments exactly one tier counter
/// and `total_requests` once.
///
/// # Concurrency
///
/// All fields are concurrent structures; `dispatch` takes `&self` and is
/// called from many worker tasks at once. No lock is held across the
/// handler invocation.
#[derive(Debug, Default)]
pub struct Engine {
    routes: RouteTable,
    cache: ResponseCache,
    counters: TierCounters,
    bridge: HandlerBridge,
}

impl Engine {
    /// Creates an engine with an unbounded response cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine whose response cache holds at most
    /// `cache_capacity` entries.
    pub fn with_cache_capacity(cache_capacity: usize) -> Self {
        Self {
            routes: RouteTable::new(),
            cache: ResponseCache::with_capacity(cache_capacity),
            counters: TierCounters::new(),
            bridge: HandlerBridge::new(),
        }
    }

    /// The route populations.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// The response cache.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// The dispatch counters.
    pub fn counters(&self) -> &TierCounters {
        &self.counters
    }

    /// The handler bridge slot.
    pub fn bridge(&self) -> &HandlerBridge {
        &self.bridge
    }

    /// Installs the host handler. One-shot; later attempts fail.
    pub fn install_handler(&self, handler: Box<dyn Handler>) -> Result<(), BridgeError> {
        self.bridge.install(handler)
    }

    /// Registers a pre-rendered static route.
    pub fn register_static(
        &self,
        method: Method,
        path: &str,
        response: RenderedResponse,
    ) -> Result<(), RegistrationError> {
        self.routes.register_static(method, path, response)
    }

    /// Registers a dynamic route with its cache policy.
    pub fn register_dynamic(
        &self,
        method: Method,
        pattern: &str,
        handler_name: &str,
        ttl_seconds: u64,
    ) -> Result<(), RegistrationError> {
        self.routes
            .register_dynamic(method, pattern, handler_name, ttl_seconds)
    }

    /// Installs the engine's built-in static routes and returns how many
    /// were actually inserted. Host-registered entries are never
    /// overwritten; an occupied key simply doesn't count.
    pub fn install_builtin_routes(&self) -> u64 {
        let banner = json!({
            "service": "troika",
            "version": env!("CARGO_PKG_VERSION"),
            "tiers": ["static", "cached", "dynamic"],
        });
        let health = json!({
            "status": "healthy",
            "version": env!("CARGO_PKG_VERSION"),
        });

        let builtins = [
            ("/", banner.to_string()),
            ("/health", health.to_string()),
        ];

        let mut installed = 0;
        for (path, body) in builtins {
            let response = RenderedResponse::json(200, body.into_bytes());
            if self.routes.register_static(Method::Get, path, response).is_ok() {
                installed += 1;
            }
        }
        installed
    }

    /// Classifies and serves one request.
    ///
    /// The request body plays no part in classification; handlers receive
    /// method, path and parameters only.
    pub fn dispatch(&self, method: Method, path: &str) -> Arc<RenderedResponse> {
        // Tier 1: exact static probe. Parameters are never extracted here.
        if let Some(response) = self.routes.lookup_static(method, path) {
            self.counters.record_static_hit();
            debug!("static hit: {} {}", method, path);
            return response;
        }

        // Tier 2: cache probe. Only requests that previously reached the
        // dynamic tier can have populated this.
        let key = cache_key(method, path);
        if let Some(response) = self.cache.lookup(&key) {
            self.counters.record_cached_hit();
            debug!("cache hit: {} {}", method, path);
            return response;
        }

        // Tier 3: dynamic match in registration order.
        let Some((route, params)) = self.routes.match_dynamic(method, path) else {
            self.counters.record_not_found();
            debug!("no route: {} {}", method, path);
            return Arc::new(RenderedResponse::error_json(404, "not_found"));
        };

        if route.cacheable() {
            self.counters.record_cache_miss();
        }

        match self.bridge.invoke(method, path, &params) {
            Ok(response) => {
                let response = Arc::new(response);
                if route.cacheable() {
                    self.cache.insert(key, response.clone(), route.clone());
                }
                self.counters.record_dynamic_hit();
                debug!(
                    "dynamic hit: {} {} -> {} ({})",
                    method, path, response.status, route.handler_name
                );
                response
            }
            Err(BridgeError::NotInstalled) => {
                self.counters.record_dynamic_hit();
                self.counters.record_handler_error();
                warn!(
                    "dynamic match for {} {} but no handler installed",
                    method, path
                );
                Arc::new(RenderedResponse::error_json(500, "no_handler"))
            }
            Err(err) => {
                self.counters.record_dynamic_hit();
                self.counters.record_handler_error();
                warn!(
                    "handler failure for {} {} ({}): {}",
                    method, path, route.handler_name, err
                );
                Arc::new(RenderedResponse::error_json(500, "handler_failed"))
            }
        }
    }

    /// Snapshot of the dispatch counters.
    pub fn stats(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Zeroes the dispatch counters.
    pub fn reset_counters(&self) {
        self.counters.reset()
    }

    /// Empties the response cache.
    pub fn clear_cache(&self) {
        self.cache.clear()
    }
}
