//! Exhaustive squared-L2 index.
//!
//! Every query is compared against every stored vector. Single documents
//! produce at most a few thousand passages, where a linear scan is exact
//! and fast enough.

use super::{squared_l2, SearchResult, VectorIndex};
use crate::chunking::Passage;
use crate::error::{LeseError, Result};
use tracing::{debug, instrument};

/// Flat index holding vectors and passages as aligned arrays.
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    vectors: Vec<Vec<f32>>,
    passages: Vec<Passage>,
    dimension: usize,
}

impl FlatIndex {
    /// An index with no entries. Searching it fails with [`LeseError::EmptyIndex`].
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build an index from aligned vectors and passages.
    ///
    /// Fails with [`LeseError::Embedding`] when the lengths differ or any
    /// vector has a different dimension from the first.
    pub fn from_parts(vectors: Vec<Vec<f32>>, passages: Vec<Passage>) -> Result<Self> {
        if vectors.len() != passages.len() {
            return Err(LeseError::Embedding(format!(
                "{} vectors for {} passages",
                vectors.len(),
                passages.len()
            )));
        }

        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 && !vectors.is_empty() {
            return Err(LeseError::Embedding("Embedder returned empty vectors".to_string()));
        }

        if let Some((position, bad)) = vectors
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != dimension)
        {
            return Err(LeseError::Embedding(format!(
                "Vector {} has dimension {}, expected {}",
                position,
                bad.len(),
                dimension
            )));
        }

        Ok(Self {
            vectors,
            passages,
            dimension,
        })
    }

    /// Stored vectors in insertion order.
    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }
}

impl VectorIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.passages.len()
    }

    fn passages(&self) -> &[Passage] {
        &self.passages
    }

    #[instrument(skip(self, query), fields(entries = self.passages.len()))]
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        if self.passages.is_empty() {
            return Err(LeseError::EmptyIndex);
        }
        if top_k == 0 {
            return Err(LeseError::InvalidInput("top_k must be positive".to_string()));
        }
        if query.len() != self.dimension {
            return Err(LeseError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, squared_l2(query, v)))
            .collect();

        // Stable sort: equal distances keep insertion order.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(top_k);

        debug!("Search returned {} results", scored.len());

        Ok(scored
            .into_iter()
            .map(|(i, distance)| SearchResult {
                passage: self.passages[i].clone(),
                distance,
            })
            .collect())
    }
}
