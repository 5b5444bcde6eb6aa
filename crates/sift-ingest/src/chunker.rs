//! Content chunking for retrieval.
//!
//! Text is normalized, then cut into windows of at most `chunk_size`
//! characters. Each window prefers to end right after a sentence terminator,
//! then at whitespace, and only falls back to a hard cut when neither occurs
//! in the last [`BOUNDARY_WINDOW`] characters. Consecutive windows overlap by
//! `chunk_overlap` characters.
//!
//! All positions are `char` offsets, never byte offsets.

use crate::error::{IngestError, IngestResult};
use crate::parsers::ParsedDocument;
use regex::Regex;
use sift_core::TextChunk;

/// How far back from the ideal end a boundary is searched for.
pub const BOUNDARY_WINDOW: usize = 200;

/// Configuration for chunking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Maximum size of each chunk in characters.
    pub chunk_size: usize,
    /// Number of characters shared by consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkConfig {
    /// Create config from the chunking settings.
    pub fn from_config(config: &sift_config::ChunkingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }

    fn validate(&self) -> IngestResult<()> {
        if self.chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Content chunker for splitting text.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkConfig,
    spaces: Regex,
    blank_lines: Regex,
}

impl Chunker {
    /// Create a new chunker, rejecting an invalid configuration.
    pub fn new(config: ChunkConfig) -> IngestResult<Self> {
        config.validate()?;

        let spaces = Regex::new(r"[ \t]+").map_err(|e| IngestError::ProcessingError(e.to_string()))?;
        let blank_lines =
            Regex::new(r"\n{3,}").map_err(|e| IngestError::ProcessingError(e.to_string()))?;

        Ok(Self {
            config,
            spaces,
            blank_lines,
        })
    }

    pub fn config(&self) -> ChunkConfig {
        self.config
    }

    /// Collapse space/tab runs, squeeze 3+ newlines to two and trim.
    pub fn normalize(&self, text: &str) -> String {
        let text = self.spaces.replace_all(text, " ");
        let text = self.blank_lines.replace_all(&text, "\n\n");
        text.trim().to_string()
    }

    /// Split text into chunks.
    pub fn chunk_text(&self, text: &str) -> Vec<TextChunk> {
        let mut chunks = Vec::new();
        let mut next_index = 0;
        self.chunk_into(text, 0, None, &mut next_index, &mut chunks);
        chunks
    }

    /// Split a parsed document, one page at a time when it has pages.
    ///
    /// Chunk indices run across all pages. Positions are shifted by the raw
    /// length of every preceding page, blank pages included.
    pub fn chunk_document(&self, doc: &ParsedDocument) -> Vec<TextChunk> {
        let Some(pages) = &doc.pages else {
            return self.chunk_text(&doc.content);
        };

        let mut chunks = Vec::new();
        let mut next_index = 0;
        let mut offset = 0;

        for (i, page) in pages.iter().enumerate() {
            let page_number = u32::try_from(i + 1).unwrap_or(u32::MAX);
            self.chunk_into(page, offset, Some(page_number), &mut next_index, &mut chunks);
            offset += page.chars().count();
        }

        chunks
    }

    fn chunk_into(
        &self,
        text: &str,
        offset: usize,
        page_number: Option<u32>,
        next_index: &mut usize,
        out: &mut Vec<TextChunk>,
    ) {
        let normalized = self.normalize(text);
        let chars: Vec<char> = normalized.chars().collect();
        let len = chars.len();
        let mut p = 0;

        while p < len {
            let end = self.find_end(&chars, p);
            let span: String = chars[p..end].iter().collect();
            let content = span.trim();

            if !content.is_empty() {
                let mut chunk = TextChunk::new(*next_index, content, offset + p, offset + end);
                if let Some(page) = page_number {
                    chunk = chunk.with_page(page);
                }
                out.push(chunk);
                *next_index += 1;
            }

            if end >= len {
                break;
            }

            let mut next = end.saturating_sub(self.config.chunk_overlap);
            if next <= p {
                next = p + (end - p).max(1);
            }
            p = next;
        }
    }

    /// End (exclusive) of the chunk starting at `p`.
    fn find_end(&self, chars: &[char], p: usize) -> usize {
        let len = chars.len();
        let ideal_end = (p + self.config.chunk_size).min(len);
        if ideal_end >= len {
            return len;
        }

        let floor = p.max(ideal_end.saturating_sub(BOUNDARY_WINDOW));

        for i in (floor..ideal_end).rev() {
            if matches!(chars[i], '.' | '!' | '?' | '\n')
                && chars.get(i + 1).map_or(true, |c| c.is_whitespace())
            {
                return i + 1;
            }
        }

        for i in (floor..ideal_end).rev() {
            if i > p && chars[i].is_whitespace() {
                return i;
            }
        }

        ideal_end
    }
}
