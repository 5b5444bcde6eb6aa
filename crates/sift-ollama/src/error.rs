//! Error types for Ollama operations.

use thiserror::Error;

/// Errors that can occur when interacting with Ollama.
#[derive(Error, Debug)]
pub enum OllamaError {
    #[error("Ollama did not answer within {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Model not found: {model}. Run 'ollama pull {model}' to download it.")]
    ModelNotFound { model: String },

    #[error("Cannot reach Ollama at {host}. Start it with 'ollama serve'.")]
    ServerNotRunning { host: String },

    #[error("Ollama returned {status}: {message}")]
    ApiError { status: u16, message: String },

    /// The server answered with the wrong number of embeddings.
    #[error("Expected {expected} embeddings, got {actual}")]
    EmbeddingCount { expected: usize, actual: usize },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for Ollama operations.
pub type OllamaResult<T> = Result<T, OllamaError>;
