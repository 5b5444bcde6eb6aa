//! Database error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Index schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: i32, supported: i32 },

    #[error("Background task failed: {0}")]
    Task(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl From<DbError> for sift_core::Error {
    fn from(err: DbError) -> Self {
        sift_core::Error::Store(err.to_string())
    }
}
