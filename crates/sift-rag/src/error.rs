//! Error types for the answer engine.

use thiserror::Error;

/// Result type for answer engine operations.
pub type RagResult<T> = Result<T, RagError>;

/// Errors that can occur while answering a query.
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Query is empty")]
    EmptyQuery,

    #[error("Invalid guardrail pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Collaborator(#[from] sift_core::Error),
}
