//! Plain-text documents.
//!
//! Pages are separated by form feeds, the convention `pdftotext` and most
//! print pipelines use.

use super::{DocumentSource, PageText, TextExtractor};
use crate::error::{LeseError, Result};

const PAGE_BREAK: char = '\u{000C}';

/// Extractor for UTF-8 text files.
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn extract(&self, document: &DocumentSource) -> Result<Vec<PageText>> {
        if document.bytes.is_empty() {
            return Err(LeseError::Extraction(format!(
                "{} has zero pages",
                document.name
            )));
        }

        let text = std::str::from_utf8(&document.bytes).map_err(|e| {
            LeseError::Extraction(format!("{} is not valid UTF-8: {}", document.name, e))
        })?;

        Ok(text
            .split(PAGE_BREAK)
            .enumerate()
            .map(|(i, page)| PageText::new(i as u32 + 1, page))
            .collect())
    }
}
