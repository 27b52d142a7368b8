//! Passage chunking for breaking page text into retrievable units.
//!
//! Provides different strategies for splitting a page into bounded-size passages.

mod fixed;
mod words;

pub use fixed::FixedWidthChunker;
pub use words::WordChunker;

use serde::{Deserialize, Serialize};

/// A bounded unit of document text with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Text content of this passage.
    pub text: String,
    /// 1-based page the passage came from.
    pub page: u32,
    /// Source document identifier.
    pub source: String,
}

impl Passage {
    /// Create a new passage.
    pub fn new(text: impl Into<String>, page: u32, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page,
            source: source.into(),
        }
    }

    /// Provenance label, e.g. `report.pdf, page 3`.
    pub fn citation(&self) -> String {
        format!("{}, page {}", self.source, self.page)
    }
}

/// Chunking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    /// Greedy word fill bounded by joined character length.
    Words,
    /// Fixed-width character slices.
    Fixed,
}

impl std::str::FromStr for ChunkingStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "words" | "word" => Ok(ChunkingStrategy::Words),
            "fixed" | "chars" => Ok(ChunkingStrategy::Fixed),
            _ => Err(format!("Unknown chunking strategy: {}", s)),
        }
    }
}

/// Trait for passage chunking implementations.
pub trait Chunker: Send + Sync {
    /// Split one page of text into passages tagged with `page_number` and `source`.
    ///
    /// Empty or whitespace-only text yields no passages.
    fn chunk(
        &self,
        page_text: &str,
        page_number: u32,
        source: &str,
        max_chunk_size: usize,
    ) -> Vec<Passage>;
}

/// Create a chunker based on the strategy.
pub fn create_chunker(strategy: ChunkingStrategy) -> Box<dyn Chunker> {
    match strategy {
        ChunkingStrategy::Words => Box::new(WordChunker::new()),
        ChunkingStrategy::Fixed => Box::new(FixedWidthChunker::new()),
    }
}
