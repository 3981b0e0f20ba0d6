//! # Troika-rs Dispatch Engine
//!
//! A three-tier HTTP request-dispatch engine built with Rust and Tokio.
//! Troika classifies every incoming request into the fastest applicable
//! service path: a pre-rendered static table, a TTL-bounded response
//! cache, or a dynamic pattern match that invokes host-authored handler
//! code through a single cross-language bridge.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use troika_rs::models::method::Method;
//! use troika_rs::models::response::RenderedResponse;
//! use troika_rs::server::Server;
//! use troika_rs::services::engine::Engine;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let engine = Arc::new(Engine::new());
//!
//!     engine
//!         .register_static(
//!             Method::Get,
//!             "/ping",
//!             RenderedResponse::new(200, "text/plain", b"pong".to_vec()),
//!         )
//!         .expect("route registration");
//!
//!     Server::bind(engine, "127.0.0.1", 8080).await?.serve().await
//! }
//! ```
//!
//! ## The Three Tiers
//!
//! 1. **Static**: exact (method, path) probe of pre-rendered responses.
//!    Nothing is recomputed; parameters are never extracted.
//! 2. **Cached**: a TTL-bounded memo of previous dynamic responses,
//!    keyed by method and path, evicted lazily on lookup.
//! 3. **Dynamic**: compiled `{name}` patterns scanned in registration
//!    order; a match forwards (method, path, ordered parameters) across
//!    the handler bridge and the reply is rendered, served, and (when
//!    the route's TTL allows) cached.
//!
//! Classification order is fixed: static, then cache, then dynamic, then
//! 404. A request never falls back upward.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────┐   ┌──────────────────────────────┐   ┌───────────────┐
//! │ Client  │──▶│  Server (accept/parse/write) │──▶│ host handlers │
//! │ (HTTP/  │   │   ┌──────────────────────────┤   │  (via bridge  │
//! │  1.1)   │   │   │ Engine::dispatch         │   │   callable)   │
//! └─────────┘   │   │  static ▸ cache ▸ dynamic│   └───────────────┘
//!               │   ├──────────────────────────┤
//!               │   │ RouteTable  ResponseCache│
//!               │   │ TierCounters HandlerBridge
//!               │   └──────────────────────────┘
//!               └──────────────────────────────┘
//! ```
//!
//! ## Concurrency Model
//!
//! The server runs on Tokio's multi-threaded runtime; each accepted
//! connection is one task running the pipeline to completion. The hot
//! path reads shared state without locks: the static table is a sharded
//! concurrent map, dynamic routes are per-method copy-on-write snapshots,
//! and counters are relaxed atomics. Registration remains possible while
//! serving and becomes visible on the next dispatch.
//!
//! ## Module Organization
//!
//! - [`models`] - Method tokens, parameter maps, rendered responses
//! - [`services`] - Route table, cache, counters, bridge, and the engine
//! - [`server`] - The TCP listener, request parser, and serializer
//! - [`utils`] - Route pattern compilation
//! - [`logs`] - Logging configuration and structured output

pub mod logs;
pub mod models;
pub mod server;
pub mod services;
pub mod utils;
