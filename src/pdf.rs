//! PDF text extraction wrapper.
//!
//! Byte-level PDF parsing is delegated to `lopdf`; this module only walks
//! pages in order and hands their raw text to the processing pipeline. Pages
//! whose content cannot be decoded are skipped with a diagnostic rather than
//! failing the document.

use std::path::Path;
use thiserror::Error;

/// Errors raised while opening a report PDF.
#[derive(Debug, Error)]
pub enum PdfError {
    /// The document could not be loaded or parsed at all.
    #[error("Failed to load PDF: {0}")]
    Load(#[from] lopdf::Error),
}

/// Maximum length of the first-page excerpt returned for UI display.
const EXCERPT_MAX_CHARS: usize = 500;

/// An opened sustainability-report PDF.
pub struct PdfReport {
    document: lopdf::Document,
}

impl PdfReport {
    /// Open a PDF from disk.
    pub fn load(path: &Path) -> Result<Self, PdfError> {
        let document = lopdf::Document::load(path)?;
        Ok(Self { document })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Raw text of every page, keyed by 1-based page number, in page order.
    ///
    /// Pages that fail text extraction are skipped with a debug log; an
    /// image-only or encrypted document therefore yields an empty list, not
    /// an error.
    pub fn page_texts(&self) -> Vec<(u32, String)> {
        let mut pages = Vec::new();
        for page_number in self.document.get_pages().keys() {
            match self.document.extract_text(&[*page_number]) {
                Ok(text) => pages.push((*page_number, text)),
                Err(err) => {
                    tracing::debug!(page = page_number, error = %err, "Skipping unreadable page");
                }
            }
        }
        pages
    }

    /// Short excerpt of the first page, for UI display only.
    ///
    /// Newlines are flattened and the text is truncated to 500 characters on
    /// a char boundary. Returns `None` when the first page has no text.
    pub fn first_page_excerpt(&self) -> Option<String> {
        let (_, text) = self.page_texts().into_iter().next()?;
        let flattened = text.trim().replace('\n', " ");
        if flattened.is_empty() {
            return None;
        }
        if flattened.chars().count() <= EXCERPT_MAX_CHARS {
            return Some(flattened);
        }
        let truncated: String = flattened.chars().take(EXCERPT_MAX_CHARS).collect();
        Some(format!("{truncated}..."))
    }
}
