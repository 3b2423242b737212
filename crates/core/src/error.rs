//! Unified error types for docfetch.
//!
//! Every message names the coordinates a caller needs to self-correct:
//! the URL, the page range or the chunk number.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Classification of a non-200 HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    NotFound,
    AccessDenied,
    RateLimited,
    ServerError,
    BadRequest,
    Unauthorized,
    Unexpected,
}

impl StatusClass {
    /// Classify a non-200 status code.
    pub fn from_code(code: u16) -> Self {
        match code {
            404 => StatusClass::NotFound,
            403 => StatusClass::AccessDenied,
            429 => StatusClass::RateLimited,
            500 => StatusClass::ServerError,
            400 => StatusClass::BadRequest,
            401 => StatusClass::Unauthorized,
            _ => StatusClass::Unexpected,
        }
    }

    /// Human-readable label for the class.
    pub fn label(self) -> &'static str {
        match self {
            StatusClass::NotFound => "resource not found",
            StatusClass::AccessDenied => "access denied",
            StatusClass::RateLimited => "rate limit exceeded",
            StatusClass::ServerError => "server error",
            StatusClass::BadRequest => "bad request",
            StatusClass::Unauthorized => "unauthorized",
            StatusClass::Unexpected => "unexpected status",
        }
    }

    /// Only rate limiting and server errors are worth another attempt.
    pub fn is_retryable(self) -> bool {
        matches!(self, StatusClass::RateLimited | StatusClass::ServerError)
    }
}

impl std::fmt::Display for StatusClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Unified error types for docfetch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., no search terms).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Transport failure that survived every attempt.
    #[error("NETWORK_ERROR: failed to make request after {attempts} attempts: {url}: {message}")]
    Network { url: String, attempts: u32, message: String },

    /// Non-200 response.
    #[error("HTTP_ERROR: {class} (status {code}) for {url}")]
    HttpStatus { url: String, code: u16, class: StatusClass },

    /// A retryable status persisted through every attempt.
    #[error("HTTP_ERROR: {class} (status {code}) for {url} after {attempts} attempts")]
    RetriesExhausted { url: String, code: u16, class: StatusClass, attempts: u32 },

    /// Malformed JSON when JSON was requested.
    #[error("DECODE_ERROR: invalid JSON from {url}: {message}")]
    Decode { url: String, message: String },

    /// Response body exceeds the configured limit.
    #[error("FETCH_TOO_LARGE: {url}: {size} bytes exceeds {limit}")]
    FetchTooLarge { url: String, size: usize, limit: usize },

    /// The caller cancelled the operation.
    #[error("CANCELLED: request to {0} was cancelled")]
    Cancelled(String),

    /// Unreadable or corrupt PDF.
    #[error("PDF_PARSE_ERROR: {0}")]
    PdfParse(String),

    /// Requested page window lies outside the document.
    #[error("PAGE_RANGE: start page {start_page} exceeds total pages {total_pages}")]
    PageRange { start_page: i64, total_pages: usize },

    /// Requested chunk lies outside the text.
    #[error("CHUNK_RANGE: chunk {chunk_number} out of range (total chunks: {total_chunks})")]
    ChunkRange { chunk_number: i64, total_chunks: usize },

    /// No page in the range yielded any text.
    #[error(
        "EMPTY_EXTRACTION: no text extracted from pages {start_page}-{end_page}{} ({failed_pages} failed)",
        of_url(.url)
    )]
    EmptyExtraction { start_page: usize, end_page: usize, failed_pages: usize, url: Option<String> },
}

fn of_url(url: &Option<String>) -> String {
    url.as_deref().map(|u| format!(" of {u}")).unwrap_or_default()
}

impl Error {
    /// Whether the fetch loop may try again after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network { .. } => true,
            Error::HttpStatus { class, .. } => class.is_retryable(),
            _ => false,
        }
    }

    /// Name the document in PDF errors raised by code that only saw its bytes.
    pub fn for_document(self, url: &str) -> Self {
        match self {
            Error::PdfParse(message) => Error::PdfParse(format!("{url}: {message}")),
            Error::EmptyExtraction { start_page, end_page, failed_pages, .. } => {
                Error::EmptyExtraction { start_page, end_page, failed_pages, url: Some(url.to_string()) }
            }
            other => other,
        }
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidInput(_) => -32602,
            Error::InvalidUrl(_) => -32003,
            Error::Network { .. } => -32006,
            Error::HttpStatus { .. } | Error::RetriesExhausted { .. } => -32008,
            Error::Decode { .. } => -32013,
            Error::FetchTooLarge { .. } => -32007,
            Error::Cancelled(_) => -32800,
            Error::PdfParse(_) => -32014,
            Error::PageRange { .. } => -32015,
            Error::ChunkRange { .. } => -32016,
            Error::EmptyExtraction { .. } => -32000,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
