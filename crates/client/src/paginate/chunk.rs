//! Fixed-size character chunks over extracted text.
//!
//! Offsets count characters, not bytes, so a chunk never splits a UTF-8
//! sequence. Concatenating chunks `1..=total_chunks` gives back the input.

use docfetch_core::Error;
use serde::Serialize;

pub const DEFAULT_CHUNK_SIZE: i64 = 5000;
pub const MIN_CHUNK_SIZE: i64 = 1000;
pub const MAX_CHUNK_SIZE: i64 = 10_000;

/// Caller intent for a chunked read.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkRequest {
    pub chunk_size: Option<i64>,
    pub chunk_number: Option<i64>,
    pub info_only: bool,
}

/// One chunk's position, with `[start, end)` in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkWindow {
    pub chunk_number: usize,
    pub total_chunks: usize,
    pub chunk_size: usize,
    pub start: usize,
    pub end: usize,
}

/// Clamp a requested chunk size to `[1000, 10000]`, defaulting to 5000.
pub fn effective_chunk_size(requested: Option<i64>) -> usize {
    requested.unwrap_or(DEFAULT_CHUNK_SIZE).clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE) as usize
}

/// `ceil(length / chunk_size)`.
pub fn total_chunks(length: usize, chunk_size: usize) -> usize {
    length.div_ceil(chunk_size.max(1))
}

impl ChunkWindow {
    /// Resolve `chunk_number` against a text of `length` characters.
    pub fn resolve(chunk_number: i64, chunk_size: usize, length: usize) -> Result<Self, Error> {
        let total = total_chunks(length, chunk_size);
        if chunk_number < 1 || chunk_number > total as i64 {
            return Err(Error::ChunkRange { chunk_number, total_chunks: total });
        }

        let number = chunk_number as usize;
        let start = (number - 1) * chunk_size;
        let end = (number * chunk_size).min(length);
        Ok(Self { chunk_number: number, total_chunks: total, chunk_size, start, end })
    }

    pub fn previous_chunk(&self) -> Option<usize> {
        (self.chunk_number > 1).then(|| self.chunk_number - 1)
    }

    pub fn next_chunk(&self) -> Option<usize> {
        (self.chunk_number < self.total_chunks).then(|| self.chunk_number + 1)
    }
}

/// Chunk metadata without content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkInfo {
    pub total_chunks: usize,
    pub chunk_size: usize,
    pub total_length: usize,
}

/// One chunk of text with navigation hints.
#[derive(Debug, Clone, Serialize)]
pub struct TextChunk {
    pub window: ChunkWindow,
    pub content: String,
    pub total_length: usize,
    pub previous_chunk: Option<usize>,
    pub next_chunk: Option<usize>,
}

/// Result of a chunked read.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ChunkView {
    Info(ChunkInfo),
    Chunk(TextChunk),
}

/// Read `text` according to `request`.
pub fn chunk_text(text: &str, request: &ChunkRequest) -> Result<ChunkView, Error> {
    let chunk_size = effective_chunk_size(request.chunk_size);
    let length = text.chars().count();

    if request.info_only {
        return Ok(ChunkView::Info(ChunkInfo {
            total_chunks: total_chunks(length, chunk_size),
            chunk_size,
            total_length: length,
        }));
    }

    let window = ChunkWindow::resolve(request.chunk_number.unwrap_or(1), chunk_size, length)?;
    let content = char_slice(text, window.start, window.end).to_string();

    Ok(ChunkView::Chunk(TextChunk {
        window,
        content,
        total_length: length,
        previous_chunk: window.previous_chunk(),
        next_chunk: window.next_chunk(),
    }))
}

/// Slice `text` by character offsets `[start, end)`.
fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let mut offsets = text.char_indices().map(|(idx, _)| idx).chain(std::iter::once(text.len()));
    let from = offsets.nth(start).unwrap_or(text.len());
    let to = if end > start { offsets.nth(end - start - 1).unwrap_or(text.len()) } else { from };
    &text[from..to]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, size: i64, number: i64) -> Result<TextChunk, Error> {
        let request = ChunkRequest { chunk_size: Some(size), chunk_number: Some(number), info_only: false };
        match chunk_text(text, &request)? {
            ChunkView::Chunk(c) => Ok(c),
            other => panic!("expected chunk, got {other:?}"),
        }
    }

    #[test]
    fn test_chunk_size_clamped() {
        assert_eq!(effective_chunk_size(None), 5000);
        assert_eq!(effective_chunk_size(Some(10)), 1000);
        assert_eq!(effective_chunk_size(Some(50_000)), 10_000);
        assert_eq!(effective_chunk_size(Some(2500)), 2500);
    }

    #[test]
    fn test_total_chunks() {
        assert_eq!(total_chunks(0, 1000), 0);
        assert_eq!(total_chunks(1, 1000), 1);
        assert_eq!(total_chunks(1000, 1000), 1);
        assert_eq!(total_chunks(1001, 1000), 2);
        assert_eq!(total_chunks(9000, 5000), 2);
    }

    #[test]
    fn test_two_chunks_of_9000() {
        let text: String = "abcdefghij".repeat(900);
        assert_eq!(text.len(), 9000);

        let info = chunk_text(&text, &ChunkRequest { chunk_size: Some(5000), info_only: true, ..Default::default() })
            .unwrap();
        assert!(matches!(info, ChunkView::Info(ChunkInfo { total_chunks: 2, chunk_size: 5000, total_length: 9000 })));

        let first = chunk(&text, 5000, 1).unwrap();
        assert_eq!((first.window.start, first.window.end), (0, 5000));
        assert_eq!(first.content, &text[..5000]);
        assert_eq!(first.previous_chunk, None);
        assert_eq!(first.next_chunk, Some(2));

        let second = chunk(&text, 5000, 2).unwrap();
        assert_eq!((second.window.start, second.window.end), (5000, 9000));
        assert_eq!(second.content, &text[5000..]);
        assert_eq!(second.previous_chunk, Some(1));
        assert_eq!(second.next_chunk, None);
    }

    #[test]
    fn test_chunk_out_of_range() {
        let text = "x".repeat(2500);
        assert!(matches!(chunk(&text, 1000, 4), Err(Error::ChunkRange { chunk_number: 4, total_chunks: 3 })));
        assert!(matches!(chunk(&text, 1000, 0), Err(Error::ChunkRange { chunk_number: 0, .. })));
        assert!(matches!(chunk(&text, 1000, -2), Err(Error::ChunkRange { chunk_number: -2, .. })));
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(matches!(chunk("", 1000, 1), Err(Error::ChunkRange { chunk_number: 1, total_chunks: 0 })));
    }

    #[test]
    fn test_round_trip() {
        let base = "Zażółć gęślą jaźń. Art. 12 ust. 3 - przepis końcowy.\n";
        for repeat in [1, 19, 20, 77, 250] {
            let text = base.repeat(repeat);
            for size in [1000, 1500, 4096] {
                let chunk_size = effective_chunk_size(Some(size));
                let total = total_chunks(text.chars().count(), chunk_size);
                let mut rebuilt = String::new();
                for n in 1..=total {
                    rebuilt.push_str(&chunk(&text, size, n as i64).unwrap().content);
                }
                assert_eq!(rebuilt.as_bytes(), text.as_bytes(), "repeat={repeat} size={size}");
            }
        }
    }

    #[test]
    fn test_multibyte_boundaries() {
        let text = "ą".repeat(1500);
        let first = chunk(&text, 1000, 1).unwrap();
        assert_eq!(first.content.chars().count(), 1000);
        let second = chunk(&text, 1000, 2).unwrap();
        assert_eq!(second.content.chars().count(), 500);
        assert_eq!(second.window.end, 1500);
    }

    #[test]
    fn test_char_slice() {
        assert_eq!(char_slice("żółw", 1, 3), "ół");
        assert_eq!(char_slice("żółw", 0, 4), "żółw");
        assert_eq!(char_slice("żółw", 4, 4), "");
    }
}
