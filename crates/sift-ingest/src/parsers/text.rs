//! Plain text document parser.

use super::{DocumentParser, ParsedDocument};
use crate::error::{IngestError, IngestResult};
use std::path::Path;

const PROSE_EXTENSIONS: &[&str] = &["txt", "text", "log", "rst", "org"];
const DATA_EXTENSIONS: &[&str] = &["csv", "tsv", "json", "yaml", "yml", "toml", "xml"];
const CODE_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "ts", "go", "c", "cpp", "h", "java", "rb", "sh", "sql", "html", "css",
];

/// Parser for plain text, structured data and source files.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected, so a
/// stray binary byte in a log file does not stop it from being indexed.
pub struct TextParser {
    extensions: Vec<&'static str>,
}

impl TextParser {
    /// Create a new text parser.
    pub fn new() -> Self {
        let extensions = PROSE_EXTENSIONS
            .iter()
            .chain(DATA_EXTENSIONS)
            .chain(CODE_EXTENSIONS)
            .copied()
            .collect();
        Self { extensions }
    }

    fn format_of(extension: &str) -> &'static str {
        let extension = extension.to_lowercase();
        if DATA_EXTENSIONS.contains(&extension.as_str()) {
            "data"
        } else if CODE_EXTENSIONS.contains(&extension.as_str()) {
            "code"
        } else {
            "text"
        }
    }
}

impl Default for TextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for TextParser {
    fn parse(&self, path: &Path) -> IngestResult<ParsedDocument> {
        if !path.exists() {
            return Err(IngestError::FileNotFound(path.to_path_buf()));
        }

        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let metadata = serde_json::json!({
            "format": Self::format_of(extension),
            "length": content.chars().count(),
            "lines": content.lines().count(),
        });

        let mut doc = ParsedDocument::new(content).with_metadata(metadata);
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            doc = doc.with_title(name);
        }

        Ok(doc)
    }

    fn extensions(&self) -> &[&str] {
        &self.extensions
    }
}
