//! pdf_read tool implementation.
//!
//! Fetches a PDF and returns page count, a window of pages, or the full text.

use std::collections::BTreeMap;
use std::sync::Arc;

use docfetch_client::{AcceptKind, PdfBackend, PdfPageRequest, PdfView, ResilientFetcher, paginate_pdf};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{json_result, query_pairs, require_url, run_blocking};

/// Input parameters for the pdf_read tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PdfReadParams {
    /// The URL of the PDF.
    pub url: String,

    /// Query parameters merged into the URL's query string.
    #[serde(default)]
    pub params: Option<BTreeMap<String, String>>,

    /// First page of the window, 1-based.
    /// Omit together with pages_per_chunk to read the whole document.
    #[serde(default)]
    pub start_page: Option<i64>,

    /// Pages per window (default: 5, max: 20).
    #[serde(default)]
    pub pages_per_chunk: Option<i64>,

    /// Return only the page count.
    #[serde(default)]
    pub info_only: bool,
}

/// Output structure for the pdf_read tool.
#[derive(Debug, Clone, Serialize)]
pub struct PdfReadOutput {
    pub url: String,
    pub from_cache: bool,
    #[serde(flatten)]
    pub view: PdfView,
}

/// Implementation of the pdf_read tool.
pub async fn pdf_read_impl(
    fetcher: &ResilientFetcher, backend: Arc<dyn PdfBackend>, cancel: &CancellationToken, params: PdfReadParams,
) -> Result<CallToolResult, McpError> {
    require_url(&params.url)?;

    let doc = fetcher
        .fetch(cancel, &params.url, &query_pairs(params.params.as_ref()), AcceptKind::Pdf)
        .await?;

    let request = PdfPageRequest {
        start_page: params.start_page,
        pages_per_chunk: params.pages_per_chunk,
        info_only: params.info_only,
    };
    let bytes = doc.bytes;
    let view = run_blocking(move || paginate_pdf(backend.as_ref(), &bytes, &request))
        .await
        .map_err(|e| e.for_document(&doc.url))?;

    tracing::debug!(url = %doc.url, from_cache = doc.from_cache, "pdf read");
    json_result(&PdfReadOutput { url: doc.url, from_cache: doc.from_cache, view })
}
