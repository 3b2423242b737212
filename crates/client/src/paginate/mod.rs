//! Bounded views over large documents.
//!
//! PDFs are read in page windows, extracted HTML text in character chunks.
//! Every view carries the hints needed to request its neighbours.

pub mod chunk;
pub mod pdf;

pub use chunk::{ChunkInfo, ChunkRequest, ChunkView, ChunkWindow, TextChunk, chunk_text};
pub use pdf::{
    ExtractionStats, PageWindow, PdfFullText, PdfInfo, PdfPageRequest, PdfView, PdfWindow, WindowHint, paginate_document,
    paginate_pdf,
};
