//! Core engine services: route storage, caching, dispatch and the host
//! handler bridge.
//!
//! # Module Organization
//!
//! - [`route_table`] - Concurrent static and dynamic route populations
//! - [`cache`] - TTL-bounded response cache with lazy eviction
//! - [`bridge`] - The one-shot handler slot and reply envelope decoding
//! - [`engine`] - The three-tier dispatcher tying the services together
//! - [`counters`] - Atomic dispatch-outcome tallies
//!
//! # Service Architecture
//!
//! ```text
//! request ──▶ Engine::dispatch
//!               │ 1. RouteTable::lookup_static   (pre-rendered, O(1))
//!               │ 2. ResponseCache::lookup       (TTL-checked)
//!               │ 3. RouteTable::match_dynamic   (registration order)
//!               │      └─▶ HandlerBridge::invoke (host callable)
//!               │            └─▶ ResponseCache::insert (TTL > 0)
//!               └── TierCounters record the outcome
//! ```
//!
//! Everything on the read path is lock-free; writes are confined to
//! registration, cache insertion and counter increments.

pub mod bridge;
pub mod cache;
pub mod counters;
pub mod engine;
pub mod route_table;
