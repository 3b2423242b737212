//! Document retrieval for mcp-docfetch.
//!
//! This crate provides the resilient HTTP fetch pipeline, PDF and HTML text
//! extraction, windowed pagination and term search shared by the server.

pub mod extract;
pub mod fetch;
pub mod paginate;
pub mod search;

pub use extract::{LopdfBackend, PdfBackend, PdfDocument, html_to_text, open_pdf};
pub use fetch::{AcceptKind, FetchConfig, FetchedDocument, ResilientFetcher};
pub use paginate::{ChunkRequest, ChunkView, PdfPageRequest, PdfView, chunk_text, paginate_pdf};
pub use search::{SearchOptions, SearchReport, search_pdf};
