//! Core types and shared functionality for docfetch.
//!
//! This crate provides:
//! - Bounded in-memory response cache
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheStats, CacheStore};
pub use config::{AppConfig, ConfigError};
pub use error::{Error, StatusClass};
