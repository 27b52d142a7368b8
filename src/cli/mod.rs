//! CLI module for Lese.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Lese - Ask questions about your documents
///
/// A local-first CLI tool for extracting, indexing and querying PDF documents.
/// The name "Lese" comes from the Norwegian word for "read."
#[derive(Parser, Debug)]
#[command(name = "lese")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check provider configuration and API keys
    Doctor,

    /// Extract, chunk and embed a document, then report the passage count
    Index {
        /// Path to a PDF (or form-feed separated text) document
        file: String,
    },

    /// Show the passages a document is split into
    Chunks {
        /// Path to the document
        file: String,

        /// Override the maximum passage length (characters)
        #[arg(short, long)]
        max_chunk_size: Option<usize>,
    },

    /// Ask a single question about a document
    Ask {
        /// Path to the document
        file: String,

        /// The question to ask
        question: String,

        /// LLM model to use for answer generation
        #[arg(short, long)]
        model: Option<String>,

        /// Number of passages to use as context
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Find the passages closest to a query
    Search {
        /// Path to the document
        file: String,

        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short = 'k', long, default_value = "5")]
        top_k: usize,
    },

    /// Start an interactive question session about a document
    Chat {
        /// Path to the document
        file: String,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Start HTTP API server for uploading documents and asking questions
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the default configuration file if none exists
    Init,

    /// Show configuration file path
    Path,
}
