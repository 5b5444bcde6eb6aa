//! Sift DB - SQLite chunk and vector store for Sift.

mod database;
mod error;
mod migrations;
mod operations;
mod store;

pub use database::Database;
pub use error::{DbError, DbResult};
pub use operations::vectors::cosine_similarity;
