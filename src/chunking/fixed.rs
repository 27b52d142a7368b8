//! Fixed-width character chunking.
//!
//! Slices page text every `max_chunk_size` characters regardless of word
//! boundaries. Slices that are only whitespace are dropped.

use super::{Chunker, Passage};

/// Fixed-width chunker.
pub struct FixedWidthChunker;

impl FixedWidthChunker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FixedWidthChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for FixedWidthChunker {
    fn chunk(
        &self,
        page_text: &str,
        page_number: u32,
        source: &str,
        max_chunk_size: usize,
    ) -> Vec<Passage> {
        let width = max_chunk_size.max(1);
        let chars: Vec<char> = page_text.chars().collect();

        chars
            .chunks(width)
            .map(|slice| slice.iter().collect::<String>())
            .filter_map(|slice| {
                let trimmed = slice.trim();
                (!trimmed.is_empty()).then(|| Passage::new(trimmed, page_number, source))
            })
            .collect()
    }
}
