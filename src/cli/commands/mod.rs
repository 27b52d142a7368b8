//! CLI command implementations.

mod ask;
mod chat;
mod chunks;
mod config;
mod doctor;
mod index;
mod search;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use chunks::run_chunks;
pub use config::run_config;
pub use doctor::run_doctor;
pub use index::run_index;
pub use search::run_search;
pub use serve::run_serve;

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::extract::DocumentSource;
use crate::session::Session;
use std::path::Path;

/// Run pre-flight checks, pointing at `lese doctor` on failure.
fn preflight(operation: Operation, settings: &Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(operation, settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'lese doctor' for detailed diagnostics.");
        return Err(e.into());
    }
    Ok(())
}

/// Read a document from disk.
fn load_document(file: &str) -> anyhow::Result<DocumentSource> {
    let path = Settings::expand_path(file);
    Ok(DocumentSource::from_path(Path::new(&path))?)
}

/// Index a document into a session behind a spinner.
async fn index_into(session: &Session, document: DocumentSource) -> anyhow::Result<usize> {
    let name = document.name.clone();
    let spinner = Output::spinner(&format!("Indexing {}...", name));

    match session.index_document(document).await {
        Ok(count) => {
            spinner.finish_and_clear();
            Output::success(&format!("Indexed {} passages from {}", count, name));
            Ok(count)
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to index {}: {}", name, e));
            Err(e.into())
        }
    }
}
