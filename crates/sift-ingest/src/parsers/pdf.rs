//! PDF document parser.

use super::{DocumentParser, ParsedDocument};
use crate::error::{IngestError, IngestResult};
use std::path::Path;
use tracing::debug;

/// Page separator emitted by the text extractor.
const FORM_FEED: char = '\x0C';

/// Parser for PDF files. Pages are exposed separately so chunks can carry
/// their page number.
pub struct PdfParser;

impl PdfParser {
    /// Create a new PDF parser.
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for PdfParser {
    fn parse(&self, path: &Path) -> IngestResult<ParsedDocument> {
        if !path.exists() {
            return Err(IngestError::FileNotFound(path.to_path_buf()));
        }

        debug!("Parsing PDF: {:?}", path);

        let raw = pdf_extract::extract_text(path).map_err(|e| IngestError::ParseError {
            path: path.to_path_buf(),
            message: format!("Failed to extract text from PDF: {}", e),
        })?;

        let pages = split_pages(&raw);
        let content = pages.join("\n\n");

        let metadata = serde_json::json!({
            "format": "pdf",
            "length": content.chars().count(),
            "pages": pages.len(),
        });

        let mut doc = ParsedDocument::new(content)
            .with_pages(pages)
            .with_metadata(metadata);

        if let Some(stem) = path.file_stem().and_then(|n| n.to_str()) {
            doc = doc.with_title(stem);
        }

        debug!("Extracted {} characters from PDF", doc.content.len());

        Ok(doc)
    }

    fn extensions(&self) -> &[&str] {
        &["pdf"]
    }
}

/// Split extracted text into cleaned pages.
fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split(FORM_FEED).map(clean_page).collect();

    // A trailing separator leaves an empty final segment.
    if pages.len() > 1 && pages.last().is_some_and(|p| p.is_empty()) {
        pages.pop();
    }

    pages
}

/// Trim every line and drop repeated blank lines.
fn clean_page(page: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in page.lines().map(str::trim) {
        if line.is_empty() && lines.last().map_or(true, |l| l.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n").trim_end().to_string()
}
