//! Text extraction from page-structured documents.
//!
//! Provides a trait-based interface for turning a document into ordered page texts.

mod pdf;
mod text;

pub use pdf::PdfExtractor;
pub use text::PlainTextExtractor;

use crate::error::{LeseError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Raw document handed to the engine by an upload or the CLI.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    /// Identifier recorded on every passage (the base file name).
    pub name: String,
    /// Raw document bytes.
    pub bytes: Vec<u8>,
}

impl DocumentSource {
    /// Create a document from a name and its bytes.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read a document from disk, naming it after the file.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LeseError::InvalidInput(format!(
                "Document not found: {}",
                path.display()
            )));
        }

        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();

        Ok(Self { name, bytes })
    }

    /// Whether the bytes carry a PDF header.
    pub fn is_pdf(&self) -> bool {
        self.bytes.starts_with(b"%PDF")
    }
}

/// Text of a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based page number.
    pub number: u32,
    /// Extracted text.
    pub text: String,
}

impl PageText {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Trait for document text extractors.
///
/// Implementations return pages numbered from 1 without gaps, and fail with
/// [`LeseError::Extraction`] rather than returning empty output for unreadable input.
pub trait TextExtractor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Extract the ordered page texts of a document.
    fn extract(&self, document: &DocumentSource) -> Result<Vec<PageText>>;
}

/// Pick an extractor for the document: PDF by magic bytes, plain text otherwise.
pub fn extractor_for(document: &DocumentSource) -> Box<dyn TextExtractor> {
    if document.is_pdf() || document.name.to_lowercase().ends_with(".pdf") {
        Box::new(PdfExtractor::new())
    } else {
        Box::new(PlainTextExtractor::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extractor_selection() {
        let pdf = DocumentSource::new("paper.pdf", b"%PDF-1.7\n".to_vec());
        assert_eq!(extractor_for(&pdf).name(), "pdf");

        let renamed = DocumentSource::new("upload.bin", b"%PDF-1.4\n".to_vec());
        assert_eq!(extractor_for(&renamed).name(), "pdf");

        let text = DocumentSource::new("notes.txt", b"hello".to_vec());
        assert_eq!(extractor_for(&text).name(), "text");
    }

    #[test]
    fn test_from_path_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manual.txt");
        std::fs::write(&path, "page one").unwrap();

        let doc = DocumentSource::from_path(&path).unwrap();
        assert_eq!(doc.name, "manual.txt");
        assert_eq!(doc.bytes, b"page one");
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = DocumentSource::from_path(Path::new("/no/such/file.pdf")).unwrap_err();
        assert!(matches!(err, LeseError::InvalidInput(_)));
    }
}
