//! Core domain types for Sift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Deterministic identifier of a file, derived from its normalized absolute path.
pub type FileId = String;

/// Content digest of a file, used to detect unchanged files.
pub type FileHash = String;

/// Unique identifier for stored chunks.
pub type ChunkId = String;

/// Generate a new unique ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A slice of document text produced by the chunker.
///
/// Positions are character offsets into the normalized source text and
/// describe the untrimmed span; `content` is the trimmed slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub content: String,
    pub index: usize,
    pub page_number: Option<u32>,
    pub start_position: usize,
    pub end_position: usize,
}

impl TextChunk {
    pub fn new(index: usize, content: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            content: content.into(),
            index,
            page_number: None,
            start_position: start,
            end_position: end,
        }
    }

    pub fn with_page(mut self, page_number: u32) -> Self {
        self.page_number = Some(page_number);
        self
    }
}

/// Metadata persisted alongside every stored chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub file_id: FileId,
    pub file_path: String,
    pub file_name: String,
    pub file_hash: FileHash,
    pub chunk_index: usize,
    pub page_number: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Always `true` today; deletion is a hard delete by file id.
    pub is_active: bool,
}

/// The unit stored in the vector backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub id: ChunkId,
    pub vector: Vec<f32>,
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl IndexedChunk {
    pub fn new(vector: Vec<f32>, content: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            id: new_id(),
            vector,
            content: content.into(),
            metadata,
        }
    }
}

/// Summary of one indexed file, aggregated over its chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub file_id: FileId,
    pub file_path: String,
    pub file_name: String,
    pub file_hash: FileHash,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A chunk matched by a vector search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub metadata: ChunkMetadata,
    pub content: String,
    /// Relevance in `[0, 1]`, higher is better.
    pub score: f32,
}

/// Restrictions applied to a vector search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Only match chunks flagged active.
    pub active_only: bool,
    /// OR-combined file path prefixes; empty means no path restriction.
    pub path_prefixes: Vec<String>,
}

impl SearchFilter {
    /// The filter every retrieval query uses: active chunks, any path.
    pub fn active() -> Self {
        Self {
            active_only: true,
            path_prefixes: Vec::new(),
        }
    }

    pub fn with_path_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.path_prefixes = prefixes;
        self
    }

    /// Check whether a chunk passes this filter.
    pub fn matches(&self, metadata: &ChunkMetadata) -> bool {
        if self.active_only && !metadata.is_active {
            return false;
        }
        self.path_prefixes.is_empty()
            || self
                .path_prefixes
                .iter()
                .any(|prefix| metadata.file_path.starts_with(prefix.as_str()))
    }
}
