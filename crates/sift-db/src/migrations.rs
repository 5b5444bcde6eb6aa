//! Schema creation and versioning.

use crate::error::{DbError, DbResult};
use rusqlite::Connection;
use tracing::info;

/// Current schema version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i32 = 1;

/// Create the schema on a fresh database and refuse ones written by a newer build.
pub fn initialize_schema(conn: &Connection) -> DbResult<()> {
    match schema_version(conn)? {
        0 => {
            info!("Creating chunk index schema");
            create_chunk_table(conn)?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            Ok(())
        }
        SCHEMA_VERSION => Ok(()),
        found => Err(DbError::UnsupportedSchema {
            found,
            supported: SCHEMA_VERSION,
        }),
    }
}

fn schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version)
}

fn create_chunk_table(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- One row per indexed chunk, carrying its file metadata and vector
        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            file_id TEXT NOT NULL,
            file_path TEXT NOT NULL,
            file_name TEXT NOT NULL,
            file_hash TEXT NOT NULL,
            chunk_index INTEGER NOT NULL,
            page_number INTEGER,
            content TEXT NOT NULL,
            vector BLOB NOT NULL,
            dimensions INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_file ON chunks(file_id);
        CREATE INDEX IF NOT EXISTS idx_chunks_file_hash ON chunks(file_id, file_hash);
        CREATE INDEX IF NOT EXISTS idx_chunks_path ON chunks(file_path);
        "#,
    )?;

    Ok(())
}
