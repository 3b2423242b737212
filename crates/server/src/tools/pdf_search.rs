//! pdf_search tool implementation.
//!
//! Fetches a PDF and searches every page for one or more terms.

use std::collections::BTreeMap;
use std::sync::Arc;

use docfetch_client::{AcceptKind, PdfBackend, ResilientFetcher, SearchOptions, SearchReport, search_pdf};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{json_result, query_pairs, require_url, run_blocking};

/// Input parameters for the pdf_search tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PdfSearchParams {
    /// The URL of the PDF.
    pub url: String,

    /// Query parameters merged into the URL's query string.
    #[serde(default)]
    pub params: Option<BTreeMap<String, String>>,

    /// Comma-separated search terms, matched case-insensitively.
    pub terms: String,

    /// Characters of context around each match (default: 100, range 20-500).
    #[serde(default)]
    pub context_chars: Option<i64>,

    /// Maximum matches returned per term (default: 10, max: 50).
    #[serde(default)]
    pub max_matches_per_term: Option<i64>,
}

/// Output structure for the pdf_search tool.
#[derive(Debug, Clone, Serialize)]
pub struct PdfSearchOutput {
    pub url: String,
    pub from_cache: bool,
    #[serde(flatten)]
    pub report: SearchReport,
}

/// Implementation of the pdf_search tool.
pub async fn pdf_search_impl(
    fetcher: &ResilientFetcher, backend: Arc<dyn PdfBackend>, cancel: &CancellationToken, params: PdfSearchParams,
) -> Result<CallToolResult, McpError> {
    require_url(&params.url)?;
    let options = SearchOptions::new(&params.terms, params.context_chars, params.max_matches_per_term)?;

    let doc = fetcher
        .fetch(cancel, &params.url, &query_pairs(params.params.as_ref()), AcceptKind::Pdf)
        .await?;

    let bytes = doc.bytes;
    let report = run_blocking(move || search_pdf(backend.as_ref(), &bytes, &options))
        .await
        .map_err(|e| e.for_document(&doc.url))?;

    tracing::debug!(url = %doc.url, matches = report.total_matches, "pdf searched");
    json_result(&PdfSearchOutput { url: doc.url, from_cache: doc.from_cache, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{build_pdf, fetcher, output_json};
    use docfetch_client::LopdfBackend;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn params(server: &MockServer, terms: &str) -> PdfSearchParams {
        PdfSearchParams {
            url: format!("{}/act.pdf", server.uri()),
            params: None,
            terms: terms.into(),
            context_chars: None,
            max_matches_per_term: None,
        }
    }

    #[tokio::test]
    async fn test_pdf_search_groups_by_term_and_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/act.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(build_pdf(&["foo then foo", "bar", "foo"])))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher();
        let request = params(&server, "foo,bar");
        let result = pdf_search_impl(&fetcher, Arc::new(LopdfBackend), &CancellationToken::new(), request)
            .await
            .unwrap();
        let output = output_json(&result);

        assert_eq!(output["total_pages"], 3);
        assert_eq!(output["pages_scanned"], 3);
        assert_eq!(output["terms"], serde_json::json!(["foo", "bar"]));
        let foo_pages = output["results"][0]["pages"].as_array().unwrap();
        assert_eq!(foo_pages.len(), 2);
        assert_eq!(foo_pages[0]["page"], 1);
        assert_eq!(foo_pages[0]["count"], 2);
        assert_eq!(foo_pages[1]["page"], 3);
        assert_eq!(foo_pages[1]["count"], 1);
        assert_eq!(output["results"][1]["pages"][0]["page"], 2);
    }

    #[tokio::test]
    async fn test_pdf_search_rejects_empty_terms_before_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let fetcher = fetcher();
        let request = params(&server, " , ");
        let err = pdf_search_impl(&fetcher, Arc::new(LopdfBackend), &CancellationToken::new(), request)
            .await
            .unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn test_pdf_search_parse_error_names_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/act.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not a pdf".to_vec()))
            .mount(&server)
            .await;

        let fetcher = fetcher();
        let err = pdf_search_impl(&fetcher, Arc::new(LopdfBackend), &CancellationToken::new(), params(&server, "foo"))
            .await
            .unwrap_err();
        assert!(err.message.starts_with("PDF_PARSE_ERROR"));
        assert!(err.message.contains(&format!("{}/act.pdf", server.uri())));
    }
}
