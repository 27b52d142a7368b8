//! PDF text extraction backed by lopdf.

use super::{DocumentSource, PageText, TextExtractor};
use crate::error::{LeseError, Result};
use tracing::{debug, instrument, warn};

/// Extractor for PDF documents.
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    #[instrument(skip(self, document), fields(document = %document.name, bytes = document.bytes.len()))]
    fn extract(&self, document: &DocumentSource) -> Result<Vec<PageText>> {
        let pdf = lopdf::Document::load_mem(&document.bytes).map_err(|e| {
            LeseError::Extraction(format!("Could not parse {}: {}", document.name, e))
        })?;

        if pdf.is_encrypted() {
            return Err(LeseError::Extraction(format!(
                "{} is password-protected",
                document.name
            )));
        }

        let page_numbers: Vec<u32> = pdf.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(LeseError::Extraction(format!(
                "{} has zero pages",
                document.name
            )));
        }

        debug!("Extracting text from {} pages", page_numbers.len());

        let mut pages = Vec::with_capacity(page_numbers.len());
        let mut failures = 0;

        // lopdf keys pages by their 1-based position, but renumber anyway so
        // the output is contiguous even for damaged page trees.
        for (position, page_number) in page_numbers.iter().enumerate() {
            let text = match pdf.extract_text(&[*page_number]) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Could not extract text from page {}: {}", page_number, e);
                    failures += 1;
                    String::new()
                }
            };
            pages.push(PageText::new(position as u32 + 1, text));
        }

        if failures == pages.len() {
            return Err(LeseError::Extraction(format!(
                "No page of {} yielded text",
                document.name
            )));
        }

        Ok(pages)
    }
}
