//! Term search over PDF pages.
//!
//! Matching is case-insensitive and non-overlapping. Positions and context
//! windows are measured in characters of the original page text, so case
//! folding is done per character to keep offsets aligned.
//!
//! Results are grouped by term, then by page in ascending order. Each term has
//! its own match cap; once a term reaches it, later pages are still scanned for
//! the remaining terms. Scanning stops once every term is capped, and the
//! report says how many pages were actually read.

use docfetch_core::Error;
use serde::Serialize;

use crate::extract::{PdfBackend, PdfDocument, html::collapse_whitespace};

pub const DEFAULT_CONTEXT_CHARS: i64 = 100;
pub const MIN_CONTEXT_CHARS: i64 = 20;
pub const MAX_CONTEXT_CHARS: i64 = 500;

pub const DEFAULT_MAX_MATCHES: i64 = 10;
pub const MAX_MATCHES_LIMIT: i64 = 50;

const HIGHLIGHT: &str = "**";

/// Search parameters after clamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub terms: Vec<String>,
    pub context_chars: usize,
    pub max_matches_per_term: usize,
}

impl SearchOptions {
    /// Build options from raw caller input.
    ///
    /// `terms` is a comma-separated list. Fails when it holds no usable term.
    pub fn new(terms: &str, context_chars: Option<i64>, max_matches_per_term: Option<i64>) -> Result<Self, Error> {
        let terms = parse_terms(terms);
        if terms.is_empty() {
            return Err(Error::InvalidInput("at least one non-empty search term is required".into()));
        }

        Ok(Self {
            terms,
            context_chars: context_chars
                .unwrap_or(DEFAULT_CONTEXT_CHARS)
                .clamp(MIN_CONTEXT_CHARS, MAX_CONTEXT_CHARS) as usize,
            max_matches_per_term: max_matches_per_term.unwrap_or(DEFAULT_MAX_MATCHES).clamp(1, MAX_MATCHES_LIMIT)
                as usize,
        })
    }
}

/// Split a comma-separated term list.
///
/// Entries are trimmed, empty ones dropped and case-insensitive duplicates
/// removed. The first spelling of each term wins and order is kept.
pub fn parse_terms(raw: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for term in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let folded = fold_str(term);
        if !terms.iter().any(|seen| fold_str(seen) == folded) {
            terms.push(term.to_string());
        }
    }
    terms
}

/// One occurrence of a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    pub term: String,
    /// 1-based page number
    pub page: usize,
    /// Surrounding text with the match wrapped in `**`
    pub context: String,
    /// Character offset of the match within the page
    pub position: usize,
}

/// Matches for a term on one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMatches {
    pub page: usize,
    pub count: usize,
    pub matches: Vec<SearchMatch>,
}

/// Matches for one term across the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermMatches {
    pub term: String,
    pub total: usize,
    pub pages: Vec<PageMatches>,
}

/// Outcome of a search call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchReport {
    pub terms: Vec<String>,
    pub total_pages: usize,
    /// Pages read before every term reached its cap
    pub pages_scanned: usize,
    pub pages_failed: usize,
    pub total_matches: usize,
    pub context_chars: usize,
    pub max_matches_per_term: usize,
    pub results: Vec<TermMatches>,
}

/// Open `bytes` with `backend` and search every page.
pub fn search_pdf(backend: &dyn PdfBackend, bytes: &[u8], options: &SearchOptions) -> Result<SearchReport, Error> {
    let doc = backend.open(bytes)?;
    search_document(doc.as_ref(), options)
}

/// Search an opened document.
pub fn search_document(doc: &dyn PdfDocument, options: &SearchOptions) -> Result<SearchReport, Error> {
    let total_pages = doc.page_count();
    let needles: Vec<Vec<char>> = options.terms.iter().map(|t| t.chars().map(fold_char).collect()).collect();
    let mut results: Vec<TermMatches> = options
        .terms
        .iter()
        .map(|term| TermMatches { term: term.clone(), total: 0, pages: Vec::new() })
        .collect();
    let mut pages_scanned = 0;
    let mut pages_failed = 0;

    for page in 1..=total_pages {
        if results.iter().all(|r| r.total >= options.max_matches_per_term) {
            break;
        }
        pages_scanned += 1;

        let text = match doc.page_text(page) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(page, error = %err, "skipping unreadable page during search");
                pages_failed += 1;
                continue;
            }
        };
        let original: Vec<char> = text.chars().collect();
        let folded: Vec<char> = original.iter().copied().map(fold_char).collect();

        for (entry, needle) in results.iter_mut().zip(&needles) {
            let remaining = options.max_matches_per_term - entry.total;
            if remaining == 0 {
                continue;
            }

            let matches: Vec<SearchMatch> = find_all(&folded, needle, remaining)
                .into_iter()
                .map(|position| SearchMatch {
                    term: entry.term.clone(),
                    page,
                    context: context_window(&original, position, needle.len(), options.context_chars),
                    position,
                })
                .collect();

            if !matches.is_empty() {
                entry.total += matches.len();
                entry.pages.push(PageMatches { page, count: matches.len(), matches });
            }
        }
    }

    if pages_scanned > 0 && pages_failed == pages_scanned {
        return Err(Error::EmptyExtraction {
            start_page: 1,
            end_page: pages_scanned,
            failed_pages: pages_failed,
            url: None,
        });
    }

    let total_matches = results.iter().map(|r| r.total).sum();
    tracing::debug!(total_pages, pages_scanned, pages_failed, total_matches, "search complete");

    Ok(SearchReport {
        terms: options.terms.clone(),
        total_pages,
        pages_scanned,
        pages_failed,
        total_matches,
        context_chars: options.context_chars,
        max_matches_per_term: options.max_matches_per_term,
        results,
    })
}

fn fold_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(single), None) => single,
        _ => c,
    }
}

fn fold_str(s: &str) -> String {
    s.chars().map(fold_char).collect()
}

/// Start offsets of up to `limit` non-overlapping occurrences of `needle`.
fn find_all(haystack: &[char], needle: &[char], limit: usize) -> Vec<usize> {
    let mut found = Vec::new();
    if needle.is_empty() || needle.len() > haystack.len() {
        return found;
    }

    let mut from = 0;
    while found.len() < limit && from + needle.len() <= haystack.len() {
        match haystack[from..].windows(needle.len()).position(|w| w == needle) {
            Some(offset) => {
                let position = from + offset;
                found.push(position);
                from = position + needle.len();
            }
            None => break,
        }
    }
    found
}

/// `context_chars` characters around the match at `position`, clipped to the page.
fn context_window(page: &[char], position: usize, term_len: usize, context_chars: usize) -> String {
    let before = context_chars / 2;
    let after = context_chars - before;
    let start = position.saturating_sub(before);
    let match_end = position + term_len;
    let end = (match_end + after).min(page.len());

    let mut out = String::with_capacity((end - start) + 2 * HIGHLIGHT.len());
    out.extend(&page[start..position]);
    out.push_str(HIGHLIGHT);
    out.extend(&page[position..match_end]);
    out.push_str(HIGHLIGHT);
    out.extend(&page[match_end..end]);

    collapse_whitespace(&out).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::LopdfBackend;
    use crate::extract::testing::{FakeDocument, build_pdf};

    fn options(terms: &str) -> SearchOptions {
        SearchOptions::new(terms, None, None).unwrap()
    }

    fn strip_markers(context: &str) -> String {
        context.replace(HIGHLIGHT, "")
    }

    #[test]
    fn test_parse_terms() {
        assert_eq!(parse_terms("foo, bar ,,baz"), vec!["foo", "bar", "baz"]);
        assert_eq!(parse_terms("Foo,foo,FOO,bar"), vec!["Foo", "bar"]);
        assert!(parse_terms(" , ,").is_empty());
    }

    #[test]
    fn test_options_clamped() {
        let opts = SearchOptions::new("a", Some(5), Some(500)).unwrap();
        assert_eq!(opts.context_chars, 20);
        assert_eq!(opts.max_matches_per_term, 50);

        let opts = SearchOptions::new("a", Some(10_000), Some(0)).unwrap();
        assert_eq!(opts.context_chars, 500);
        assert_eq!(opts.max_matches_per_term, 1);

        let opts = options("a");
        assert_eq!(opts.context_chars, 100);
        assert_eq!(opts.max_matches_per_term, 10);
    }

    #[test]
    fn test_options_require_terms() {
        assert!(matches!(SearchOptions::new(" ,, ", None, None), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_grouped_by_term_then_page() {
        let doc = FakeDocument::new(&["foo and foo again, then bar", "nothing here", "a final foo"]);
        let report = search_document(&doc, &options("foo,bar")).unwrap();

        assert_eq!(report.total_pages, 3);
        assert_eq!(report.total_matches, 4);

        let foo = &report.results[0];
        assert_eq!(foo.term, "foo");
        assert_eq!(foo.total, 3);
        let foo_pages: Vec<(usize, usize)> = foo.pages.iter().map(|p| (p.page, p.count)).collect();
        assert_eq!(foo_pages, vec![(1, 2), (3, 1)]);

        let bar = &report.results[1];
        assert_eq!(bar.term, "bar");
        assert_eq!(bar.total, 1);
        assert_eq!(bar.pages[0].page, 1);
    }

    #[test]
    fn test_case_insensitive() {
        let doc = FakeDocument::new(&["Ustawa o PODATKU; podatek dochodowy"]);
        let report = search_document(&doc, &options("Podat")).unwrap();
        let matches = &report.results[0].pages[0].matches;
        assert_eq!(matches.len(), 2);
        assert!(matches[0].context.contains("**PODAT**"));
        assert!(matches[1].context.contains("**podat**"));
    }

    #[test]
    fn test_positions_are_char_offsets() {
        let doc = FakeDocument::new(&["żółć żółć"]);
        let report = search_document(&doc, &options("ŻÓŁĆ")).unwrap();
        let positions: Vec<usize> = report.results[0].pages[0].matches.iter().map(|m| m.position).collect();
        assert_eq!(positions, vec![0, 5]);
    }

    #[test]
    fn test_repeated_substring_is_non_overlapping() {
        let doc = FakeDocument::new(&["aaaaa"]);
        let report = search_document(&doc, &options("aa")).unwrap();
        let positions: Vec<usize> = report.results[0].pages[0].matches.iter().map(|m| m.position).collect();
        assert_eq!(positions, vec![0, 2]);
    }

    #[test]
    fn test_cap_per_term_across_pages() {
        let page = "tax ".repeat(6);
        let doc = FakeDocument::new(&[&page, &page, "rate tax"]);
        let opts = SearchOptions::new("tax,rate", None, Some(8)).unwrap();
        let report = search_document(&doc, &opts).unwrap();

        let tax = &report.results[0];
        assert_eq!(tax.total, 8);
        let counts: Vec<(usize, usize)> = tax.pages.iter().map(|p| (p.page, p.count)).collect();
        assert_eq!(counts, vec![(1, 6), (2, 2)]);

        let rate = &report.results[1];
        assert_eq!(rate.total, 1);
        assert_eq!(rate.pages[0].page, 3);
        assert_eq!(report.total_matches, 9);
    }

    #[test]
    fn test_context_bounded_and_contains_term() {
        let filler = "lorem ipsum dolor sit amet ".repeat(40);
        let text = format!("{filler}NEEDLE{filler}");
        let doc = FakeDocument::new(&[&text]);
        let opts = SearchOptions::new("needle", Some(40), None).unwrap();
        let report = search_document(&doc, &opts).unwrap();

        let m = &report.results[0].pages[0].matches[0];
        assert!(m.context.contains("**NEEDLE**"));
        assert!(strip_markers(&m.context).chars().count() <= 40 + "needle".len());
        assert!(strip_markers(&m.context).to_lowercase().contains("needle"));
    }

    #[test]
    fn test_context_clipped_at_page_edges() {
        let doc = FakeDocument::new(&["needle at the start and the end needle"]);
        let opts = SearchOptions::new("needle", Some(20), None).unwrap();
        let report = search_document(&doc, &opts).unwrap();
        let matches = &report.results[0].pages[0].matches;
        assert!(matches[0].context.starts_with("**needle**"));
        assert!(matches[1].context.ends_with("**needle**"));
    }

    #[test]
    fn test_context_whitespace_collapsed() {
        let doc = FakeDocument::new(&["before\n\n   the\tterm   after"]);
        let report = search_document(&doc, &options("term")).unwrap();
        assert_eq!(report.results[0].pages[0].matches[0].context, "before the **term** after");
    }

    #[test]
    fn test_unreadable_pages_counted() {
        let doc = FakeDocument::with_failures(&[Some("foo"), None, Some("foo")]);
        let report = search_document(&doc, &options("foo")).unwrap();
        assert_eq!(report.pages_failed, 1);
        assert_eq!(report.pages_scanned, 3);
        assert_eq!(report.results[0].total, 2);
    }

    #[test]
    fn test_early_stop_reports_pages_scanned() {
        let doc = FakeDocument::with_failures(&[Some("foo"), None, None, Some("bar")]);
        let capped = SearchOptions::new("foo", None, Some(1)).unwrap();
        let report = search_document(&doc, &capped).unwrap();

        assert_eq!(report.total_pages, 4);
        assert_eq!(report.pages_scanned, 1);
        assert_eq!(report.pages_failed, 0);
        assert_eq!(report.total_matches, 1);
    }

    #[test]
    fn test_all_pages_unreadable() {
        let doc = FakeDocument::with_failures(&[None, None]);
        let result = search_document(&doc, &options("foo"));
        assert!(matches!(result, Err(Error::EmptyExtraction { failed_pages: 2, .. })));
    }

    #[test]
    fn test_no_matches() {
        let doc = FakeDocument::new(&["alpha", "beta"]);
        let report = search_document(&doc, &options("gamma")).unwrap();
        assert_eq!(report.total_matches, 0);
        assert!(report.results[0].pages.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let doc = FakeDocument::new(&["foo bar foo", "bar foo", "baz"]);
        let opts = options("foo,bar,baz");
        assert_eq!(search_document(&doc, &opts).unwrap(), search_document(&doc, &opts).unwrap());
    }

    #[test]
    fn test_search_real_pdf() {
        let bytes = build_pdf(&["foo and foo", "nothing", "last foo bar"]);
        let report = search_pdf(&LopdfBackend, &bytes, &options("foo,bar")).unwrap();
        assert_eq!(report.total_pages, 3);

        let foo_pages: Vec<(usize, usize)> = report.results[0].pages.iter().map(|p| (p.page, p.count)).collect();
        assert_eq!(foo_pages, vec![(1, 2), (3, 1)]);
        assert_eq!(report.results[1].pages[0].page, 3);
    }

    #[test]
    fn test_search_garbage_bytes() {
        let result = search_pdf(&LopdfBackend, b"not a pdf", &options("foo"));
        assert!(matches!(result, Err(Error::PdfParse(_))));
    }
}
