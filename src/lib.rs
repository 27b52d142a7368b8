//! Lese - Ask questions about your documents
//!
//! A local-first tool for extracting text from PDF documents, indexing it and
//! answering questions grounded in the retrieved passages.
//!
//! The name "Lese" comes from the Norwegian word for "read."
//!
//! # Overview
//!
//! Lese allows you to:
//! - Extract page text from PDF (and plain-text) documents
//! - Split pages into passages and embed them into a vector index
//! - Retrieve the passages closest to a question
//! - Generate answers that cite their source pages
//!
//! # Architecture
//!
//! - `config` - Configuration management and prompt templates
//! - `extract` - Page text extraction
//! - `chunking` - Passage chunking strategies
//! - `embedding` - Embedding generation
//! - `index` - Exact nearest-neighbour vector index
//! - `retriever` - Document indexing and passage retrieval
//! - `rag` - Grounded answer generation
//! - `session` - Per-caller state and question history
//!
//! # Example
//!
//! ```rust,no_run
//! use lese::config::Settings;
//! use lese::extract::DocumentSource;
//! use lese::session::Session;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let session = Session::from_settings(&settings)?;
//!
//!     let document = DocumentSource::from_path(Path::new("manual.pdf"))?;
//!     let chunks = session.index_document(document).await?;
//!     println!("Indexed {} passages", chunks);
//!
//!     println!("{}", session.ask("How long is the warranty?").await?);
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
pub mod openai;
pub mod rag;
pub mod retriever;
pub mod session;

pub use error::{LeseError, Result};
