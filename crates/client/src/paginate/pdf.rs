//! Page-window reading of PDF documents.

use docfetch_core::Error;
use serde::Serialize;

use crate::extract::{PdfBackend, PdfDocument};

/// Default number of pages per window.
pub const DEFAULT_PAGES_PER_CHUNK: i64 = 5;

/// Largest window a caller may request.
pub const MAX_PAGES_PER_CHUNK: i64 = 20;

/// Caller intent for a PDF read.
///
/// With neither `start_page` nor `pages_per_chunk` set (and `info_only`
/// false) the whole document is extracted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfPageRequest {
    pub start_page: Option<i64>,
    pub pages_per_chunk: Option<i64>,
    pub info_only: bool,
}

/// Inclusive page range, always `1 <= start_page <= end_page <= total_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub start_page: usize,
    pub end_page: usize,
    pub total_pages: usize,
    pub pages_per_chunk: usize,
}

/// Where an adjacent window starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowHint {
    pub start_page: usize,
    pub pages_per_chunk: usize,
}

/// Clamp a requested window size to `[1, 20]`, defaulting to 5.
pub fn effective_pages_per_chunk(requested: Option<i64>) -> usize {
    requested.unwrap_or(DEFAULT_PAGES_PER_CHUNK).clamp(1, MAX_PAGES_PER_CHUNK) as usize
}

impl PageWindow {
    /// Resolve a window request against a document of `total_pages`.
    ///
    /// A start below 1 is clamped to 1; a start past the last page is an error.
    pub fn resolve(start_page: Option<i64>, pages_per_chunk: Option<i64>, total_pages: usize) -> Result<Self, Error> {
        let per = effective_pages_per_chunk(pages_per_chunk);
        let requested = start_page.unwrap_or(1);

        if requested > total_pages as i64 || total_pages == 0 {
            return Err(Error::PageRange { start_page: requested, total_pages });
        }

        let start = requested.max(1) as usize;
        let end = (start + per - 1).min(total_pages);

        Ok(Self { start_page: start, end_page: end, total_pages, pages_per_chunk: per })
    }

    /// Number of pages covered.
    pub fn page_span(&self) -> usize {
        self.end_page - self.start_page + 1
    }

    /// Window before this one, if any.
    pub fn previous_window(&self) -> Option<WindowHint> {
        (self.start_page > 1).then(|| WindowHint {
            start_page: self.start_page.saturating_sub(self.pages_per_chunk).max(1),
            pages_per_chunk: self.pages_per_chunk,
        })
    }

    /// Window after this one, if any.
    pub fn next_window(&self) -> Option<WindowHint> {
        (self.end_page < self.total_pages)
            .then(|| WindowHint { start_page: self.end_page + 1, pages_per_chunk: self.pages_per_chunk })
    }
}

/// Per-page extraction accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionStats {
    pub pages_attempted: usize,
    /// Pages that produced non-empty text.
    pub pages_succeeded: usize,
    pub pages_failed: usize,
    /// Pages that extracted cleanly but held no text.
    pub pages_empty: usize,
    pub failed_pages: Vec<usize>,
}

/// Document metadata without text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PdfInfo {
    pub total_pages: usize,
    pub pages_per_chunk: usize,
}

/// One window of text.
#[derive(Debug, Clone, Serialize)]
pub struct PdfWindow {
    pub window: PageWindow,
    pub text: String,
    pub stats: ExtractionStats,
    pub previous: Option<WindowHint>,
    pub next: Option<WindowHint>,
}

/// Text of every page.
#[derive(Debug, Clone, Serialize)]
pub struct PdfFullText {
    pub total_pages: usize,
    pub text: String,
    pub stats: ExtractionStats,
}

/// Result of a PDF read.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PdfView {
    Info(PdfInfo),
    Window(PdfWindow),
    Full(PdfFullText),
}

/// Header placed before each page's text.
pub fn page_marker(page: usize) -> String {
    format!("--- Page {page} ---")
}

/// Open `bytes` with `backend` and read it according to `request`.
///
/// The document handle lives only for this call.
pub fn paginate_pdf(backend: &dyn PdfBackend, bytes: &[u8], request: &PdfPageRequest) -> Result<PdfView, Error> {
    let doc = backend.open(bytes)?;
    paginate_document(doc.as_ref(), request)
}

/// Read an opened document according to `request`.
pub fn paginate_document(doc: &dyn PdfDocument, request: &PdfPageRequest) -> Result<PdfView, Error> {
    let total_pages = doc.page_count();

    if request.info_only {
        return Ok(PdfView::Info(PdfInfo {
            total_pages,
            pages_per_chunk: effective_pages_per_chunk(request.pages_per_chunk),
        }));
    }

    if request.start_page.is_none() && request.pages_per_chunk.is_none() {
        if total_pages == 0 {
            return Err(Error::PdfParse("document contains no pages".into()));
        }
        let (text, stats) = extract_range(doc, 1, total_pages)?;
        return Ok(PdfView::Full(PdfFullText { total_pages, text, stats }));
    }

    let window = PageWindow::resolve(request.start_page, request.pages_per_chunk, total_pages)?;
    let (text, stats) = extract_range(doc, window.start_page, window.end_page)?;

    Ok(PdfView::Window(PdfWindow {
        window,
        text,
        stats,
        previous: window.previous_window(),
        next: window.next_window(),
    }))
}

/// Extract pages `start..=end`, skipping unreadable ones.
///
/// Fails only when no page in the range produced text.
pub fn extract_range(doc: &dyn PdfDocument, start: usize, end: usize) -> Result<(String, ExtractionStats), Error> {
    let mut stats = ExtractionStats::default();
    let mut sections = Vec::with_capacity(end.saturating_sub(start) + 1);

    for page in start..=end {
        stats.pages_attempted += 1;
        match doc.page_text(page) {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    stats.pages_empty += 1;
                } else {
                    stats.pages_succeeded += 1;
                    sections.push(format!("{}\n{}", page_marker(page), text));
                }
            }
            Err(err) => {
                tracing::warn!(page, error = %err, "skipping unreadable page");
                stats.pages_failed += 1;
                stats.failed_pages.push(page);
            }
        }
    }

    if sections.is_empty() {
        return Err(Error::EmptyExtraction {
            start_page: start,
            end_page: end,
            failed_pages: stats.pages_failed,
            url: None,
        });
    }

    Ok((sections.join("\n\n"), stats))
}
