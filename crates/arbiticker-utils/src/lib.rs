//! Shared utilities for arbiticker
//!
//! This crate provides common functionality used across the arbiticker workspace:
//! tracing setup and the application-level configuration that drives it.

pub mod config;
pub mod logging;

pub use config::{Config, ConfigError, LogFormat};
pub use logging::{init_tracing, try_init_tracing};
