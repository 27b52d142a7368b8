//! Search command implementation.

use super::{index_into, load_document, preflight};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::session::Session;

/// Run the search command.
pub async fn run_search(file: &str, query: &str, top_k: usize, settings: Settings) -> anyhow::Result<()> {
    preflight(Operation::Index, &settings)?;

    let document = load_document(file)?;
    let session = Session::from_settings(&settings)?;
    index_into(&session, document).await?;

    let spinner = Output::spinner("Searching...");
    let results = session.search(query, top_k).await;
    spinner.finish_and_clear();

    let results = results?;
    if results.is_empty() {
        Output::warning("No matching passages found.");
        return Ok(());
    }

    Output::header(&format!("Found {} passages", results.len()));
    for (i, result) in results.iter().enumerate() {
        Output::passage(
            i + 1,
            &result.passage.source,
            result.passage.page,
            Some(result.distance),
            &result.passage.text,
        );
    }

    Ok(())
}
