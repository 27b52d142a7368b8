//! Error types for Lese.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Library-level error type for Lese operations.
#[derive(Error, Debug)]
pub enum LeseError {
    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Index is empty: the document contained no searchable text")]
    EmptyIndex,

    #[error("No document has been indexed yet")]
    NotIndexed,

    #[error("Query vector has dimension {actual}, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("{operation} timed out after {limit:?}")]
    Timeout { operation: &'static str, limit: Duration },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl LeseError {
    /// Stable, machine-readable label for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LeseError::Extraction(_) => "extraction",
            LeseError::Embedding(_) => "embedding",
            LeseError::EmptyIndex => "empty_index",
            LeseError::NotIndexed => "not_indexed",
            LeseError::DimensionMismatch { .. } => "dimension_mismatch",
            LeseError::Generation(_) => "generation",
            LeseError::Timeout { .. } => "timeout",
            LeseError::Config(_) => "config",
            LeseError::InvalidInput(_) => "invalid_input",
            LeseError::Io(_) => "io",
            LeseError::Json(_) => "json",
            LeseError::TomlParse(_) => "toml",
            LeseError::Http(_) => "http",
        }
    }
}

/// Result type alias for Lese operations.
pub type Result<T> = std::result::Result<T, LeseError>;

/// Run a capability call, failing with [`LeseError::Timeout`] once `limit` elapses.
pub async fn with_timeout<T>(
    operation: &'static str,
    limit: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(LeseError::Timeout {
            operation,
            limit,
        }),
    }
}
