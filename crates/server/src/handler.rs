//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use docfetch_client::{LopdfBackend, PdfBackend, ResilientFetcher};

use crate::tools::{
    DocumentFetchParams, HtmlReadParams, PdfReadParams, PdfSearchParams,
    cache::{CacheClearParams, clear_impl, status_impl},
    fetch_impl, html_read_impl, pdf_read_impl, pdf_search_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for mcp-docfetch.
#[derive(Clone)]
pub struct DocfetchServer {
    tool_router: ToolRouter<Self>,
    fetcher: Arc<ResilientFetcher>,
    pdf: Arc<dyn PdfBackend>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// Each tool receives the request context so a client-side cancel aborts
/// retries and backoff waits.
#[tool_router]
impl DocfetchServer {
    /// Create a handler that fetches through `fetcher` and reads PDFs with lopdf.
    pub fn new(fetcher: Arc<ResilientFetcher>) -> Self {
        Self::with_backend(fetcher, Arc::new(LopdfBackend))
    }

    pub fn with_backend(fetcher: Arc<ResilientFetcher>, pdf: Arc<dyn PdfBackend>) -> Self {
        Self { tool_router: Self::tool_router(), fetcher, pdf }
    }

    #[tool(description = "Fetch a URL with retries and caching. \
        Returns parsed JSON for accept=json, page text for accept=html, and size metadata otherwise.")]
    async fn document_fetch(
        &self, params: Parameters<DocumentFetchParams>, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.fetcher, &context.ct, params.0).await
    }

    #[tool(description = "Read a PDF by URL. Returns the page count (info_only), a window of pages \
        (start_page/pages_per_chunk, max 20 pages) or the full text, with navigation hints.")]
    async fn pdf_read(
        &self, params: Parameters<PdfReadParams>, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        pdf_read_impl(&self.fetcher, Arc::clone(&self.pdf), &context.ct, params.0).await
    }

    #[tool(description = "Read an HTML page by URL as plain text in fixed-size character chunks \
        (chunk_size 1000-10000, chunk_number from 1).")]
    async fn html_read(
        &self, params: Parameters<HtmlReadParams>, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        html_read_impl(&self.fetcher, &context.ct, params.0).await
    }

    #[tool(description = "Search a PDF for comma-separated terms. \
        Returns matches grouped by term and page with highlighted context.")]
    async fn pdf_search(
        &self, params: Parameters<PdfSearchParams>, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        pdf_search_impl(&self.fetcher, Arc::clone(&self.pdf), &context.ct, params.0).await
    }

    #[tool(description = "Report response cache statistics: requests, hits, misses, hit rate and occupancy.")]
    async fn cache_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(self.fetcher.cache())
    }

    #[tool(description = "Clear the response cache. scope=all (default) removes everything, \
        scope=expired removes only entries past their TTL.")]
    async fn cache_clear(&self, params: Parameters<CacheClearParams>) -> Result<CallToolResult, McpError> {
        clear_impl(self.fetcher.cache(), params.0)
    }
}

impl ServerHandler for DocfetchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "mcp-docfetch".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        tracing::debug!(tool = %request.name, "tool call");
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
