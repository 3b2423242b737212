//! html_read tool implementation.
//!
//! Fetches an HTML page, reduces it to plain text and returns one chunk.

use std::collections::BTreeMap;

use docfetch_client::{AcceptKind, ChunkRequest, ChunkView, ResilientFetcher, chunk_text, html_to_text};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{json_result, query_pairs, require_url, run_blocking};

/// Input parameters for the html_read tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HtmlReadParams {
    /// The URL of the page.
    pub url: String,

    /// Query parameters merged into the URL's query string.
    #[serde(default)]
    pub params: Option<BTreeMap<String, String>>,

    /// Characters per chunk (default: 5000, range 1000-10000).
    #[serde(default)]
    pub chunk_size: Option<i64>,

    /// 1-based chunk to return (default: 1).
    #[serde(default)]
    pub chunk_number: Option<i64>,

    /// Return only the chunk count.
    #[serde(default)]
    pub info_only: bool,
}

/// Output structure for the html_read tool.
#[derive(Debug, Clone, Serialize)]
pub struct HtmlReadOutput {
    pub url: String,
    pub from_cache: bool,
    #[serde(flatten)]
    pub view: ChunkView,
}

/// Implementation of the html_read tool.
pub async fn html_read_impl(
    fetcher: &ResilientFetcher, cancel: &CancellationToken, params: HtmlReadParams,
) -> Result<CallToolResult, McpError> {
    require_url(&params.url)?;

    let doc = fetcher
        .fetch(cancel, &params.url, &query_pairs(params.params.as_ref()), AcceptKind::Html)
        .await?;

    let request = ChunkRequest {
        chunk_size: params.chunk_size,
        chunk_number: params.chunk_number,
        info_only: params.info_only,
    };
    let bytes = doc.bytes;
    let view = run_blocking(move || {
        let text = html_to_text(&String::from_utf8_lossy(&bytes));
        chunk_text(&text, &request)
    })
    .await?;

    json_result(&HtmlReadOutput { url: doc.url, from_cache: doc.from_cache, view })
}
