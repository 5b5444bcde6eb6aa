//! Interfaces to the external collaborators the index depends on.
//!
//! The ingestion pipeline and the answer engine only ever talk to these
//! traits; concrete backends (Ollama, SQLite) live in their own crates.

use crate::error::Result;
use crate::types::{DocumentInfo, IndexedChunk, SearchFilter, SearchResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Turns text into embedding vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts at once. The output has one vector per input, in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Storage and similarity search over indexed chunks.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the backing collection if it does not exist yet.
    async fn ensure_collection(&self) -> Result<()>;

    /// Insert chunks in one batch.
    async fn upsert(&self, chunks: &[IndexedChunk]) -> Result<()>;

    /// Delete every chunk of a file, returning how many were removed.
    async fn delete_by_file_id(&self, file_id: &str) -> Result<usize>;

    /// Return the `top_k` best matches, ordered by descending score.
    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchResult>>;

    /// List every indexed file.
    async fn list_documents(&self) -> Result<Vec<DocumentInfo>>;

    /// Check whether a file is already indexed with exactly this content hash.
    async fn is_indexed(&self, file_id: &str, file_hash: &str) -> Result<bool>;
}

/// Sampling options passed to a language model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A text generation backend.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Identifier of the model answering requests.
    fn model_id(&self) -> &str;

    /// Generate a completion for the given prompts.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String>;
}
