//! Sift RAG - answers questions from the indexed files.
//!
//! A query is guarded, embedded, searched, filtered by relevance and only
//! then sent to the language model. Queries with nothing relevant never
//! reach the model.

mod engine;
mod error;
pub mod guardrails;
pub mod prompt;

pub use engine::{
    RagEngine, RagQuery, RagResponse, ResponseMeta, SourceReference, NO_INFORMATION_ANSWER,
};
pub use error::{RagError, RagResult};
pub use guardrails::{InputGuard, OutputGuard};
