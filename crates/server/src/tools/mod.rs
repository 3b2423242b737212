//! MCP tool implementations.
//!
//! This module contains all tools exposed by the mcp-docfetch server.

pub mod cache;
pub mod document_fetch;
pub mod html_read;
pub mod pdf_read;
pub mod pdf_search;

use std::collections::BTreeMap;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use docfetch_core::Error;

pub use document_fetch::{DocumentFetchParams, fetch_impl};
pub use html_read::{HtmlReadParams, html_read_impl};
pub use pdf_read::{PdfReadParams, pdf_read_impl};
pub use pdf_search::{PdfSearchParams, pdf_search_impl};

/// Flatten optional query parameters into `(name, value)` pairs.
pub(crate) fn query_pairs(params: Option<&BTreeMap<String, String>>) -> Vec<(String, String)> {
    params
        .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

/// Reject blank URLs before touching the network.
pub(crate) fn require_url(url: &str) -> Result<(), Error> {
    if url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()));
    }
    Ok(())
}

/// Serialize `output` as the tool's single text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Run blocking document work off the async executor.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, Error> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::PdfParse(format!("document task failed: {e}")))?
}
