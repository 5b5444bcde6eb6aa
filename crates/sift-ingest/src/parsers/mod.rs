//! Document parsers for various file types.

mod markdown;
mod pdf;
mod text;

pub use markdown::MarkdownParser;
pub use pdf::PdfParser;
pub use text::TextParser;

use crate::error::IngestResult;
use std::path::Path;

/// Parsed document content.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// The main text content.
    pub content: String,
    /// Document title (if extracted).
    pub title: Option<String>,
    /// Per-page text, for formats that have pages.
    pub pages: Option<Vec<String>>,
    /// Extracted metadata.
    pub metadata: serde_json::Value,
}

impl ParsedDocument {
    /// Create a new parsed document.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            title: None,
            pages: None,
            metadata: serde_json::json!({}),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the page segments.
    pub fn with_pages(mut self, pages: Vec<String>) -> Self {
        self.pages = Some(pages);
        self
    }

    /// Set metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether the document has no extractable text.
    pub fn is_blank(&self) -> bool {
        match &self.pages {
            Some(pages) => pages.iter().all(|p| p.trim().is_empty()),
            None => self.content.trim().is_empty(),
        }
    }
}

/// Trait for document parsers.
pub trait DocumentParser: Send + Sync {
    /// Parse a file at the given path.
    fn parse(&self, path: &Path) -> IngestResult<ParsedDocument>;

    /// Get the supported file extensions.
    fn extensions(&self) -> &[&str];

    /// Check if this parser supports the given extension.
    fn supports(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

/// Ordered set of parsers; the first one supporting an extension wins.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn DocumentParser>>,
}

impl ParserRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Registry with the built-in PDF, Markdown and text parsers.
    pub fn with_defaults() -> Self {
        Self::new()
            .with_parser(PdfParser::new())
            .with_parser(MarkdownParser::new())
            .with_parser(TextParser::new())
    }

    /// Add a parser after the existing ones.
    pub fn with_parser(mut self, parser: impl DocumentParser + 'static) -> Self {
        self.parsers.push(Box::new(parser));
        self
    }

    /// Find the parser for an extension (without the leading dot).
    pub fn find(&self, extension: &str) -> Option<&dyn DocumentParser> {
        self.parsers
            .iter()
            .find(|p| p.supports(extension))
            .map(|p| p.as_ref())
    }

    /// Check whether any parser handles the extension.
    pub fn can_parse(&self, extension: &str) -> bool {
        self.find(extension).is_some()
    }

    /// Find the parser for a path by its extension.
    pub fn for_path(&self, path: &Path) -> Option<&dyn DocumentParser> {
        let extension = path.extension().and_then(|e| e.to_str())?;
        self.find(extension)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
