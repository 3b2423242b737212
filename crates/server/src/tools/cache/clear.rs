//! cache_clear tool implementation.
//!
//! Drops every entry, or only the expired ones.

use docfetch_core::CacheStore;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Which entries to remove.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ClearScope {
    #[default]
    All,
    Expired,
}

/// Parameters for the cache_clear tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearParams {
    /// "all" (default) or "expired".
    #[serde(default)]
    pub scope: ClearScope,
}

/// Output from the cache_clear tool.
#[derive(Debug, Clone, Serialize)]
pub struct CacheClearOutput {
    pub scope: ClearScope,
    /// Number of entries deleted.
    pub deleted: usize,
    pub remaining: usize,
}

/// Implementation of the cache_clear tool.
pub fn clear_impl(cache: &CacheStore, params: CacheClearParams) -> Result<CallToolResult, McpError> {
    let deleted = match params.scope {
        ClearScope::All => cache.clear_all(),
        ClearScope::Expired => cache.clear_expired(),
    };
    tracing::info!(scope = ?params.scope, deleted, "cache cleared");

    json_result(&CacheClearOutput { scope: params.scope, deleted, remaining: cache.len() })
}
