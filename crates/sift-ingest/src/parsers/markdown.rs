//! Markdown document parser.

use super::{DocumentParser, ParsedDocument};
use crate::error::{IngestError, IngestResult};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag};
use std::path::Path;

/// Plain text rendered from a Markdown source.
#[derive(Debug, Default)]
struct Rendered {
    text: String,
    title: Option<String>,
    links: Vec<String>,
}

/// Parser for Markdown files.
///
/// Markup is stripped to plain text with paragraph breaks preserved, so the
/// chunker can still find sentence and paragraph boundaries. The first
/// level-one heading becomes the title.
pub struct MarkdownParser;

impl MarkdownParser {
    /// Create a new markdown parser.
    pub fn new() -> Self {
        Self
    }

    fn render(markdown: &str) -> Rendered {
        let mut out = Rendered::default();
        let mut heading: Option<(HeadingLevel, String)> = None;

        for event in Parser::new(markdown) {
            match event {
                Event::Start(Tag::Heading(level, _, _)) => {
                    heading = Some((level, String::new()));
                }
                Event::End(Tag::Heading(_, _, _)) => {
                    if let Some((level, text)) = heading.take() {
                        let text = text.trim();
                        if level == HeadingLevel::H1 && out.title.is_none() && !text.is_empty() {
                            out.title = Some(text.to_string());
                        }
                        out.text.push_str(text);
                        out.text.push_str("\n\n");
                    }
                }
                Event::Start(Tag::Link(_, dest, _)) => out.links.push(dest.to_string()),
                Event::Start(Tag::Item) => out.text.push_str("- "),
                Event::End(Tag::Item) => out.text.push('\n'),
                Event::End(Tag::List(_)) => out.text.push('\n'),
                Event::End(Tag::Paragraph) | Event::End(Tag::CodeBlock(_)) => {
                    out.text.push_str("\n\n")
                }
                Event::Text(t) | Event::Code(t) => match heading.as_mut() {
                    Some((_, text)) => text.push_str(&t),
                    None => out.text.push_str(&t),
                },
                Event::SoftBreak | Event::HardBreak => out.text.push('\n'),
                _ => {}
            }
        }

        out.text = out.text.trim().to_string();
        out
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for MarkdownParser {
    fn parse(&self, path: &Path) -> IngestResult<ParsedDocument> {
        if !path.exists() {
            return Err(IngestError::FileNotFound(path.to_path_buf()));
        }

        let source = std::fs::read_to_string(path)?;
        let rendered = Self::render(&source);

        let metadata = serde_json::json!({
            "format": "markdown",
            "links": rendered.links,
            "original_length": source.chars().count(),
        });

        let title = rendered.title.or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
        });

        let mut doc = ParsedDocument::new(rendered.text).with_metadata(metadata);
        if let Some(t) = title {
            doc = doc.with_title(t);
        }

        Ok(doc)
    }

    fn extensions(&self) -> &[&str] {
        &["md", "markdown", "mdown", "mkd"]
    }
}
