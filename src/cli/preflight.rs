//! Pre-flight checks before expensive operations.
//!
//! Validates that the configured providers have their API keys before
//! starting work that would otherwise fail midway.

use crate::config::{EmbeddingProvider, Settings};
use crate::error::{LeseError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Chunking only reads the document.
    Chunk,
    /// Indexing and search need the embedding provider.
    Index,
    /// Asking needs both embedding and generation providers.
    Ask,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Chunk => {}
        Operation::Index => check_embedding(settings)?,
        Operation::Ask => {
            check_embedding(settings)?;
            check_api_key(&settings.generation.api_key_env)?;
        }
    }
    Ok(())
}

fn check_embedding(settings: &Settings) -> Result<()> {
    match settings.embedding.provider {
        EmbeddingProvider::Hashing => Ok(()),
        EmbeddingProvider::OpenAI => check_api_key(&settings.embedding.api_key_env),
    }
}

/// Check if an API key environment variable is set and non-empty.
fn check_api_key(var: &str) -> Result<()> {
    let var = if var.is_empty() { "OPENAI_API_KEY" } else { var };
    match std::env::var(var) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(LeseError::Config(format!(
            "{var} is empty. Set it with: export {var}='...'"
        ))),
        Err(_) => Err(LeseError::Config(format!(
            "{var} not set. Set it with: export {var}='...'"
        ))),
    }
}
