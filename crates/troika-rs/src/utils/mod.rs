//! Utility modules for the troika-rs engine.
//!
//! - [`pattern`] - Route pattern parsing, validation and compilation

pub mod pattern;
