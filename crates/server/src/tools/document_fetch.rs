//! document_fetch tool implementation.
//!
//! Fetches a URL through the cached retry pipeline and returns the body
//! interpreted by the requested accept kind.

use std::collections::BTreeMap;

use docfetch_client::{AcceptKind, ResilientFetcher};
use docfetch_core::Error;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{json_result, query_pairs, require_url};

/// Input parameters for the document_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentFetchParams {
    /// The URL to fetch.
    pub url: String,

    /// Query parameters merged into the URL's query string.
    #[serde(default)]
    pub params: Option<BTreeMap<String, String>>,

    /// How to interpret the body: json (default), pdf, html, image or binary.
    #[serde(default)]
    pub accept: AcceptKind,
}

/// Output structure for the document_fetch tool.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentFetchOutput {
    /// Canonical URL, also used as the cache key.
    pub url: String,
    pub accept: AcceptKind,
    pub from_cache: bool,
    /// Network attempts made; 0 when served from cache.
    pub attempts: u32,
    pub size_bytes: usize,
    /// Parsed body (json only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Body decoded as UTF-8 (html only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Implementation of the document_fetch tool.
pub async fn fetch_impl(
    fetcher: &ResilientFetcher, cancel: &CancellationToken, params: DocumentFetchParams,
) -> Result<CallToolResult, McpError> {
    require_url(&params.url)?;

    let doc = fetcher
        .fetch(cancel, &params.url, &query_pairs(params.params.as_ref()), params.accept)
        .await?;

    let (data, text) = match params.accept {
        AcceptKind::Json => {
            let value = serde_json::from_slice(&doc.bytes)
                .map_err(|e| Error::Decode { url: doc.url.clone(), message: e.to_string() })?;
            (Some(value), None)
        }
        AcceptKind::Html => (None, Some(String::from_utf8_lossy(&doc.bytes).into_owned())),
        AcceptKind::Pdf | AcceptKind::Image | AcceptKind::Binary => (None, None),
    };

    json_result(&DocumentFetchOutput {
        url: doc.url,
        accept: params.accept,
        from_cache: doc.from_cache,
        attempts: doc.attempts,
        size_bytes: doc.bytes.len(),
        data,
        text,
    })
}
