//! In-memory response cache.
//!
//! - Entry-count bounded with least-recently-used eviction
//! - Per-entry TTL counted from insertion
//! - Request/hit/miss counters kept under the same lock as the entries

pub mod store;

pub use store::{CacheStats, CacheStore};
