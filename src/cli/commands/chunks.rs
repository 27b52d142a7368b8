//! Chunks command implementation.

use super::load_document;
use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::HashingEmbedder;
use crate::retriever::Retriever;
use std::sync::Arc;

/// Print the passages a document is split into, without embedding them.
pub async fn run_chunks(
    file: &str,
    max_chunk_size: Option<usize>,
    mut settings: Settings,
) -> anyhow::Result<()> {
    if let Some(size) = max_chunk_size {
        settings.chunking.max_chunk_size = size;
    }

    // Chunking never calls the embedder.
    let embedder = Arc::new(HashingEmbedder::new(settings.embedding.dimensions as usize));
    let retriever = Retriever::from_settings(embedder, &settings)?;

    let document = load_document(file)?;
    let passages = retriever.chunk_document(document).await?;

    if passages.is_empty() {
        Output::warning("No text found in document.");
        return Ok(());
    }

    Output::header(&format!(
        "{} passages ({} strategy, max {} chars)",
        passages.len(),
        settings.chunking.strategy,
        settings.chunking.max_chunk_size
    ));
    for (i, passage) in passages.iter().enumerate() {
        Output::passage(i + 1, &passage.source, passage.page, None, &passage.text);
    }

    Ok(())
}
