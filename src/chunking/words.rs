//! Greedy word-fill chunking.
//!
//! Tokens are accumulated until the next one would push the space-joined
//! length past the limit. Length is counted in characters, not bytes.

use super::{Chunker, Passage};

/// Word-boundary chunker.
///
/// A single token longer than the limit is emitted on its own rather than
/// split, so `max_chunk_size` is a soft bound.
pub struct WordChunker;

impl WordChunker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WordChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for WordChunker {
    fn chunk(
        &self,
        page_text: &str,
        page_number: u32,
        source: &str,
        max_chunk_size: usize,
    ) -> Vec<Passage> {
        let mut passages = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_len = 0;

        for token in page_text.split_whitespace() {
            let token_len = token.chars().count();

            if !current.is_empty() && current_len + 1 + token_len > max_chunk_size {
                passages.push(Passage::new(current.join(" "), page_number, source));
                current.clear();
                current_len = 0;
            }

            if current.is_empty() {
                current_len = token_len;
            } else {
                current_len += 1 + token_len;
            }
            current.push(token);
        }

        if !current.is_empty() {
            passages.push(Passage::new(current.join(" "), page_number, source));
        }

        passages
    }
}
