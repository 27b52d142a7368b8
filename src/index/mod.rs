//! Vector index abstraction for Lese.
//!
//! Provides a trait-based interface so the exhaustive [`FlatIndex`] can be
//! swapped for an approximate structure without touching the retriever.

mod flat;

pub use flat::FlatIndex;

use crate::chunking::Passage;
use crate::embedding::Embedder;
use crate::error::{with_timeout, LeseError, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument};

/// A passage with its distance from the query (lower is closer).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub passage: Passage,
    pub distance: f32,
}

/// Trait for nearest-neighbour indexes over passage vectors.
pub trait VectorIndex: Send + Sync {
    /// Vector dimension shared by every entry. Zero for an empty index.
    fn dimension(&self) -> usize;

    /// Number of stored passages.
    fn len(&self) -> usize;

    /// Whether the index holds no passages.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored passages in insertion order.
    fn passages(&self) -> &[Passage];

    /// Return the `top_k` closest passages in ascending distance order.
    ///
    /// Ties keep insertion order. Asking for more than [`VectorIndex::len`]
    /// returns everything.
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>>;
}

/// Squared Euclidean distance.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Number of passages sent to the embedder per call.
pub const EMBED_BATCH_SIZE: usize = 100;

/// Embed every passage and build a flat index over them.
///
/// Passages are embedded in batches of [`EMBED_BATCH_SIZE`]; `call_timeout`
/// bounds each batch call, not the whole build. An empty passage list yields
/// an empty index that rejects searches.
#[instrument(skip_all, fields(passages = passages.len()))]
pub async fn build(
    passages: Vec<Passage>,
    embedder: &dyn Embedder,
    call_timeout: Duration,
) -> Result<FlatIndex> {
    if passages.is_empty() {
        return Ok(FlatIndex::empty());
    }

    let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(EMBED_BATCH_SIZE) {
        let embedded = with_timeout("embedding", call_timeout, embedder.embed_batch(batch)).await?;
        vectors.extend(embedded);
    }

    if vectors.len() != passages.len() {
        return Err(LeseError::Embedding(format!(
            "Embedder returned {} vectors for {} passages",
            vectors.len(),
            passages.len()
        )));
    }

    let index = FlatIndex::from_parts(vectors, passages)?;
    if index.dimension() != embedder.dimensions() {
        return Err(LeseError::Embedding(format!(
            "Embedder {} declares {} dimensions but returned {}",
            embedder.model(),
            embedder.dimensions(),
            index.dimension()
        )));
    }

    info!(
        "Built index with {} passages ({} dimensions)",
        index.len(),
        index.dimension()
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use async_trait::async_trait;

    /// Embedder whose batch output has a wrong dimension for the second item.
    struct RaggedEmbedder;

    #[async_trait]
    impl Embedder for RaggedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; 3])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .enumerate()
                .map(|(i, _)| if i == 1 { vec![0.0; 2] } else { vec![0.0; 3] })
                .collect())
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn model(&self) -> &str {
            "ragged"
        }
    }

    /// Embedder that drops the last vector.
    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]; texts.len().saturating_sub(1)])
        }

        fn dimensions(&self) -> usize {
            1
        }

        fn model(&self) -> &str {
            "short"
        }
    }

    /// Takes a fixed time per batch and counts its calls.
    struct PacedEmbedder {
        delay: Duration,
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl Embedder for PacedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0; 2])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(vec![vec![1.0; 2]; texts.len()])
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn model(&self) -> &str {
            "paced"
        }
    }

    /// Returns shorter vectors than it declares.
    struct UndersizedEmbedder;

    #[async_trait]
    impl Embedder for UndersizedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.5; 4])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![0.5; 4]; texts.len()])
        }

        fn dimensions(&self) -> usize {
            8
        }

        fn model(&self) -> &str {
            "undersized"
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn passages(n: usize) -> Vec<Passage> {
        (0..n)
            .map(|i| Passage::new(format!("passage number {}", i), 1, "doc.pdf"))
            .collect()
    }

    #[test]
    fn test_squared_l2() {
        assert_eq!(squared_l2(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_eq!(squared_l2(&[1.0, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_build_preserves_order_and_dimension() {
        let index = build(passages(4), &HashingEmbedder::new(16), TIMEOUT).await.unwrap();

        assert_eq!(index.len(), 4);
        assert_eq!(index.dimension(), 16);
        assert_eq!(index.passages()[2].text, "passage number 2");
    }

    #[tokio::test]
    async fn test_build_empty_is_unsearchable() {
        let index = build(Vec::new(), &HashingEmbedder::new(16), TIMEOUT).await.unwrap();

        assert!(index.is_empty());
        let err = index.search(&[0.0; 16], 3).unwrap_err();
        assert!(matches!(err, LeseError::EmptyIndex));
    }

    #[tokio::test]
    async fn test_build_rejects_ragged_vectors() {
        let err = build(passages(3), &RaggedEmbedder, TIMEOUT).await.unwrap_err();
        assert!(matches!(err, LeseError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_build_rejects_missing_vectors() {
        let err = build(passages(3), &ShortEmbedder, TIMEOUT).await.unwrap_err();
        assert!(matches!(err, LeseError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_timeout_applies_per_batch() {
        let embedder = PacedEmbedder {
            delay: Duration::from_millis(40),
            calls: Default::default(),
        };

        // Five batches take ~200ms in total, each well under the 100ms bound.
        let index = build(passages(5 * EMBED_BATCH_SIZE), &embedder, Duration::from_millis(100))
            .await
            .unwrap();

        assert_eq!(index.len(), 5 * EMBED_BATCH_SIZE);
        assert_eq!(embedder.calls.load(std::sync::atomic::Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_slow_batch_times_out() {
        let embedder = PacedEmbedder {
            delay: Duration::from_millis(200),
            calls: Default::default(),
        };

        let err = build(passages(3), &embedder, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, LeseError::Timeout { operation: "embedding", .. }));
    }

    #[tokio::test]
    async fn test_build_rejects_undeclared_dimension() {
        let err = build(passages(2), &UndersizedEmbedder, TIMEOUT).await.unwrap_err();
        assert!(matches!(err, LeseError::Embedding(msg) if msg.contains("declares 8")));
    }
}
