//! Sift Ollama - Ollama integration for embeddings and answer generation.
//!
//! [`OllamaEmbedder`] and [`OllamaGenerator`] adapt the HTTP client to the
//! `Embedder` and `LanguageModel` interfaces used by ingestion and RAG.

mod client;
mod error;
mod provider;
mod types;

pub use client::OllamaClient;
pub use error::{OllamaError, OllamaResult};
pub use provider::{OllamaEmbedder, OllamaGenerator};
pub use types::*;
