//! Text extraction from fetched payloads.
//!
//! PDF access goes through the [`PdfBackend`] / [`PdfDocument`] pair so the
//! parsing library can be swapped without touching pagination or search.
//! Documents are opened per call and released when the boxed handle drops.

pub mod html;

pub use html::html_to_text;

use docfetch_core::Error;

/// An opened PDF.
pub trait PdfDocument {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Text of one page, 1-based.
    fn page_text(&self, page: usize) -> Result<String, Error>;
}

/// Opens PDF bytes into a [`PdfDocument`].
pub trait PdfBackend: Send + Sync {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, Error>;
}

/// lopdf-based backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfBackend;

struct LopdfDocument {
    doc: lopdf::Document,
    page_numbers: Vec<u32>,
}

impl PdfBackend for LopdfBackend {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, Error> {
        let doc = lopdf::Document::load_mem(bytes).map_err(|e| Error::PdfParse(format!("failed to open PDF: {e}")))?;

        if doc.is_encrypted() {
            return Err(Error::PdfParse("PDF is password protected".into()));
        }

        let page_numbers = doc.get_pages().keys().copied().collect();
        Ok(Box::new(LopdfDocument { doc, page_numbers }))
    }
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    fn page_text(&self, page: usize) -> Result<String, Error> {
        let number = page
            .checked_sub(1)
            .and_then(|idx| self.page_numbers.get(idx))
            .ok_or_else(|| Error::PdfParse(format!("page {page} does not exist ({} pages)", self.page_count())))?;

        self.doc
            .extract_text(&[*number])
            .map_err(|e| Error::PdfParse(format!("failed to extract text from page {page}: {e}")))
    }
}

/// Open `bytes` with the default backend.
pub fn open_pdf(bytes: &[u8]) -> Result<Box<dyn PdfDocument>, Error> {
    LopdfBackend.open(bytes)
}

/// PDF fixtures built in memory, shared with dependent crates through the
/// `test-util` feature.
#[cfg(any(test, feature = "test-util"))]
pub mod testing {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    /// Build a PDF with one text line per page.
    pub fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    /// In-memory document; `None` pages fail extraction.
    pub struct FakeDocument {
        pub pages: Vec<Option<String>>,
    }

    impl FakeDocument {
        pub fn new(pages: &[&str]) -> Self {
            Self { pages: pages.iter().map(|p| Some(p.to_string())).collect() }
        }

        pub fn with_failures(pages: &[Option<&str>]) -> Self {
            Self { pages: pages.iter().map(|p| p.map(str::to_string)).collect() }
        }
    }

    impl PdfDocument for FakeDocument {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_text(&self, page: usize) -> Result<String, Error> {
            match self.pages.get(page.wrapping_sub(1)) {
                Some(Some(text)) => Ok(text.clone()),
                Some(None) => Err(Error::PdfParse(format!("page {page} is unreadable"))),
                None => Err(Error::PdfParse(format!("page {page} does not exist"))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::build_pdf;
    use super::*;

    #[test]
    fn test_open_counts_pages() {
        let bytes = build_pdf(&["first", "second", "third"]);
        let doc = open_pdf(&bytes).unwrap();
        assert_eq!(doc.page_count(), 3);
    }

    #[test]
    fn test_page_text() {
        let bytes = build_pdf(&["Hello World", "Second page"]);
        let doc = open_pdf(&bytes).unwrap();
        assert!(doc.page_text(1).unwrap().contains("Hello World"));
        assert!(doc.page_text(2).unwrap().contains("Second page"));
    }

    #[test]
    fn test_page_out_of_bounds() {
        let bytes = build_pdf(&["only"]);
        let doc = open_pdf(&bytes).unwrap();
        assert!(matches!(doc.page_text(0), Err(Error::PdfParse(_))));
        assert!(matches!(doc.page_text(2), Err(Error::PdfParse(_))));
    }

    #[test]
    fn test_open_garbage() {
        let result = open_pdf(b"definitely not a pdf");
        assert!(matches!(result, Err(Error::PdfParse(_))));
    }
}
