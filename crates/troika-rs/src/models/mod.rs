//! Data models and domain types for the troika-rs dispatch engine.
//!
//! This module contains the core data structures shared across the engine:
//! the HTTP method token, the ordered parameter map produced by dynamic
//! matches, and the rendered response that every tier ultimately serves.
//!
//! # Module Organization
//!
//! - [`method`] - The closed set of HTTP method tokens the engine routes on
//! - [`params`] - Ordered parameter bindings extracted from matched paths
//! - [`response`] - Fully rendered responses and the JSON error body shape
//!
//! # Design Principles
//!
//! - **Type Safety**: method tokens are an enum, not free-form strings, so
//!   an invalid method can never reach the route tables
//! - **Ordering**: parameter maps preserve pattern order end to end, from
//!   extraction through the serialized form handed to the handler bridge
//! - **Immutability**: a rendered response is immutable once built; tiers
//!   share it behind `Arc` rather than copying bodies

pub mod method;
pub mod params;
pub mod response;
