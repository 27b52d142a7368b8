//! Interactive question session about one document.

use super::{index_into, load_document, preflight};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::session::Session;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(file: &str, model: Option<String>, mut settings: Settings) -> anyhow::Result<()> {
    if let Some(model) = model {
        settings.generation.model = model;
    }

    preflight(Operation::Ask, &settings)?;

    let document = load_document(file)?;
    let session = Session::from_settings(&settings)?;
    index_into(&session, document).await?;

    println!("\n{}", style("Lese Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about the document, or 'exit' to quit. 'history' lists past questions, 'clear' forgets them.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            session.clear_history().await;
            Output::info("Question history cleared.");
            continue;
        }

        if input.eq_ignore_ascii_case("history") {
            let history = session.history().await;
            if history.is_empty() {
                Output::info("No questions asked yet.");
            }
            for (i, entry) in history.iter().enumerate() {
                println!(
                    "{} {}",
                    style(format!("[{}]", i + 1)).green(),
                    style(&entry.question).bold()
                );
                println!("    {}", entry.answer);
            }
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        let result = session.ask_with_sources(input).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => {
                println!("\n{} {}", style("Lese:").cyan().bold(), response.answer);
                let citations: Vec<String> =
                    response.sources.iter().map(|p| p.citation()).collect();
                if !citations.is_empty() {
                    println!("{}\n", style(format!("({})", citations.join("; "))).dim());
                }
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
