//! Logging configuration for the engine.
//!
//! - [`logger`] - Structured, column-aligned `env_logger` setup

pub mod logger;
