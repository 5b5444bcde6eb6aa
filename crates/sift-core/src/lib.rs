//! Sift Core - Core types and collaborator interfaces for the Sift index.

mod error;
mod traits;
mod types;

pub use error::{Error, Result};
pub use traits::{Embedder, GenerationOptions, LanguageModel, VectorStore};
pub use types::*;
