//! cache_status tool implementation.
//!
//! Reports cache counters and occupancy.

use chrono::{DateTime, Utc};
use docfetch_core::CacheStore;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use serde::Serialize;

use crate::tools::json_result;

/// Output from the cache_status tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatusOutput {
    pub requests: u64,
    pub hits: u64,
    pub misses: u64,
    /// hits / requests, 0 when idle.
    pub hit_rate: f64,
    pub entries: usize,
    pub capacity: usize,
    pub ttl_secs: u64,
    pub last_cleanup: Option<DateTime<Utc>>,
}

/// Implementation of the cache_status tool.
pub fn status_impl(cache: &CacheStore) -> Result<CallToolResult, McpError> {
    let stats = cache.stats();
    json_result(&CacheStatusOutput {
        requests: stats.requests,
        hits: stats.hits,
        misses: stats.misses,
        hit_rate: stats.hit_rate(),
        entries: stats.entries,
        capacity: stats.capacity,
        ttl_secs: cache.ttl().as_secs(),
        last_cleanup: stats.last_cleanup,
    })
}
