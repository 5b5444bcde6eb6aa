//! Error types for Sift.

use thiserror::Error;

/// Failure reported by a collaborator (embedder, vector store or language model).
#[derive(Error, Debug)]
pub enum Error {
    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Generation error: {0}")]
    Generation(String),
}

/// Result type alias using Sift's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_collaborator() {
        assert_eq!(
            Error::Embedding("model not loaded".to_string()).to_string(),
            "Embedding error: model not loaded"
        );
        assert_eq!(
            Error::Store("disk full".to_string()).to_string(),
            "Vector store error: disk full"
        );
    }
}
