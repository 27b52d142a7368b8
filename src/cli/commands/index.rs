//! Index command implementation.

use super::{index_into, load_document, preflight};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::session::Session;

/// Run the index command: extract, chunk and embed, then report the result.
pub async fn run_index(file: &str, settings: Settings) -> anyhow::Result<()> {
    preflight(Operation::Index, &settings)?;

    let document = load_document(file)?;
    let session = Session::from_settings(&settings)?;
    index_into(&session, document).await?;

    if let Some(doc) = session.engine().retriever().indexed_document().await {
        Output::header("Document");
        Output::kv("Source", &doc.source);
        Output::kv("Pages", &doc.pages.to_string());
        Output::kv("Passages", &doc.chunk_count.to_string());
        Output::kv("Embedding model", &doc.model);
    }

    Ok(())
}
