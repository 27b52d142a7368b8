//! Document indexing and passage retrieval.
//!
//! A [`Retriever`] owns one embedder and at most one active index. Building
//! happens entirely outside the lock; the finished index is swapped in at
//! the end, so searches never observe a partial build and a failed build
//! leaves the previous index in place.

use crate::chunking::{create_chunker, Chunker, ChunkingStrategy, Passage};
use crate::config::Settings;
use crate::embedding::Embedder;
use crate::error::{with_timeout, LeseError, Result};
use crate::extract::{extractor_for, DocumentSource, PageText, TextExtractor};
use crate::index::{self, SearchResult, VectorIndex};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument};

/// Default soft bound on passage length.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 500;
/// Default number of passages returned by [`Retriever::retrieve`].
pub const DEFAULT_TOP_K: usize = 3;

/// Summary of the document behind the active index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexedDocument {
    /// Source identifier recorded on the passages.
    pub source: String,
    /// Number of pages extracted.
    pub pages: usize,
    /// Number of passages indexed.
    pub chunk_count: usize,
    /// Embedding model the index was built with.
    pub model: String,
    /// When the index was installed.
    pub indexed_at: DateTime<Utc>,
}

struct ActiveIndex {
    index: Box<dyn VectorIndex>,
    document: IndexedDocument,
}

/// Turns documents into a searchable index and questions into ranked passages.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    chunker: Box<dyn Chunker>,
    extractor: Option<Arc<dyn TextExtractor>>,
    max_chunk_size: usize,
    embed_timeout: Duration,
    active: RwLock<Option<Arc<ActiveIndex>>>,
    build_lock: Mutex<()>,
}

impl Retriever {
    /// Create a retriever with the default word chunker and limits.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            chunker: create_chunker(ChunkingStrategy::Words),
            extractor: None,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            embed_timeout: Duration::from_secs(60),
            active: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    /// Create a retriever configured from settings.
    pub fn from_settings(embedder: Arc<dyn Embedder>, settings: &Settings) -> Result<Self> {
        let strategy: ChunkingStrategy = settings
            .chunking
            .strategy
            .parse()
            .map_err(LeseError::Config)?;

        Ok(Self::new(embedder)
            .with_chunker(create_chunker(strategy))
            .with_max_chunk_size(settings.chunking.max_chunk_size)
            .with_embed_timeout(settings.embedding.timeout()))
    }

    /// Set the chunking implementation.
    pub fn with_chunker(mut self, chunker: Box<dyn Chunker>) -> Self {
        self.chunker = chunker;
        self
    }

    /// Use a fixed extractor instead of detecting one per document.
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Set the soft passage length bound.
    pub fn with_max_chunk_size(mut self, max_chunk_size: usize) -> Self {
        self.max_chunk_size = max_chunk_size;
        self
    }

    /// Set the upper bound for each embedding call.
    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    /// Summary of the active index, if any.
    pub async fn indexed_document(&self) -> Option<IndexedDocument> {
        self.active.read().await.as_ref().map(|a| a.document.clone())
    }

    /// Extract and chunk a document without embedding it.
    pub async fn chunk_document(&self, document: DocumentSource) -> Result<Vec<Passage>> {
        let source = document.name.clone();
        let pages = self.extract(document).await?;
        Ok(self.chunk_pages(&pages, &source))
    }

    /// Extract, chunk, embed and install a document, replacing the active index.
    ///
    /// Returns the number of passages indexed. On failure the previous index
    /// stays active.
    #[instrument(skip(self, document), fields(document = %document.name))]
    pub async fn index_document(&self, document: DocumentSource) -> Result<usize> {
        let _building = self.build_lock.lock().await;

        let source = document.name.clone();
        let pages = self.extract(document).await?;
        let passages = self.chunk_pages(&pages, &source);
        info!("Chunked {} pages into {} passages", pages.len(), passages.len());

        let built = index::build(passages, self.embedder.as_ref(), self.embed_timeout).await?;

        let chunk_count = built.len();
        let active = ActiveIndex {
            index: Box::new(built),
            document: IndexedDocument {
                source,
                pages: pages.len(),
                chunk_count,
                model: self.embedder.model().to_string(),
                indexed_at: Utc::now(),
            },
        };

        *self.active.write().await = Some(Arc::new(active));
        info!("Installed index with {} passages", chunk_count);

        Ok(chunk_count)
    }

    /// Return the `top_k` passages closest to the question.
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<Passage>> {
        Ok(self
            .search(question, top_k)
            .await?
            .into_iter()
            .map(|r| r.passage)
            .collect())
    }

    /// Like [`Retriever::retrieve`], keeping the distances.
    #[instrument(skip(self, question))]
    pub async fn search(&self, question: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if self.active.read().await.is_none() {
            return Err(LeseError::NotIndexed);
        }

        // Embed before touching the index so a slow provider never holds the lock.
        let query = with_timeout("embedding", self.embed_timeout, self.embedder.embed(question))
            .await?;

        let active = self
            .active
            .read()
            .await
            .clone()
            .ok_or(LeseError::NotIndexed)?;

        active.index.search(&query, top_k)
    }

    async fn extract(&self, document: DocumentSource) -> Result<Vec<PageText>> {
        let extractor = self.extractor.clone();

        tokio::task::spawn_blocking(move || match extractor {
            Some(extractor) => extractor.extract(&document),
            None => extractor_for(&document).extract(&document),
        })
        .await
        .map_err(|e| LeseError::Extraction(format!("Extraction task failed: {}", e)))?
    }

    fn chunk_pages(&self, pages: &[PageText], source: &str) -> Vec<Passage> {
        pages
            .iter()
            .flat_map(|page| {
                self.chunker
                    .chunk(&page.text, page.number, source, self.max_chunk_size)
            })
            .collect()
    }
}
