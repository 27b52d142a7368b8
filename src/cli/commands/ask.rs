//! Ask command implementation.

use super::{index_into, load_document, preflight};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::session::Session;

/// Run the ask command: index the document, then answer one question.
pub async fn run_ask(
    file: &str,
    question: &str,
    model: Option<String>,
    top_k: Option<usize>,
    mut settings: Settings,
) -> anyhow::Result<()> {
    if let Some(model) = model {
        settings.generation.model = model;
    }
    if let Some(top_k) = top_k {
        settings.retrieval.top_k = top_k;
    }

    preflight(Operation::Ask, &settings)?;

    let document = load_document(file)?;
    let session = Session::from_settings(&settings)?;
    index_into(&session, document).await?;

    let spinner = Output::spinner("Generating answer...");

    match session.ask_with_sources(question).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.answer);

            if !response.sources.is_empty() {
                Output::header("Sources");
                for (i, source) in response.sources.iter().enumerate() {
                    Output::passage(i + 1, &source.source, source.page, None, &source.text);
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
