//! Chunk CRUD operations.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use sift_core::{ChunkMetadata, DocumentInfo, IndexedChunk};

/// Columns selected whenever a chunk's metadata is read back.
pub(crate) const METADATA_COLUMNS: &str =
    "file_id, file_path, file_name, file_hash, chunk_index, page_number, created_at, updated_at, is_active";

/// Encode a float vector as little-endian f32 bytes.
pub(crate) fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Decode little-endian f32 bytes back into a vector.
pub(crate) fn bytes_to_vector(bytes: &[u8], dimensions: usize) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .take(dimensions)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Read [`METADATA_COLUMNS`] starting at column `offset`.
pub(crate) fn metadata_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<ChunkMetadata> {
    let chunk_index: i64 = row.get(offset + 4)?;
    let page_number: Option<i64> = row.get(offset + 5)?;
    let created_at: String = row.get(offset + 6)?;
    let updated_at: String = row.get(offset + 7)?;
    let is_active: i64 = row.get(offset + 8)?;

    Ok(ChunkMetadata {
        file_id: row.get(offset)?,
        file_path: row.get(offset + 1)?,
        file_name: row.get(offset + 2)?,
        file_hash: row.get(offset + 3)?,
        chunk_index: chunk_index as usize,
        page_number: page_number.map(|p| p as u32),
        created_at: parse_timestamp(&created_at),
        updated_at: parse_timestamp(&updated_at),
        is_active: is_active != 0,
    })
}

impl Database {
    /// Insert multiple chunks in a transaction.
    pub fn insert_chunks(&self, chunks: &[IndexedChunk]) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR REPLACE INTO chunks (
                    id, file_id, file_path, file_name, file_hash, chunk_index, page_number,
                    content, vector, dimensions, created_at, updated_at, is_active
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                "#,
            )?;

            for chunk in chunks {
                let meta = &chunk.metadata;
                stmt.execute(params![
                    chunk.id,
                    meta.file_id,
                    meta.file_path,
                    meta.file_name,
                    meta.file_hash,
                    meta.chunk_index as i64,
                    meta.page_number.map(i64::from),
                    chunk.content,
                    vector_to_bytes(&chunk.vector),
                    chunk.vector.len() as i64,
                    meta.created_at.to_rfc3339(),
                    meta.updated_at.to_rfc3339(),
                    meta.is_active as i64,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Delete all chunks of a file.
    pub fn delete_chunks_by_file(&self, file_id: &str) -> DbResult<usize> {
        let conn = self.conn()?;
        let count = conn.execute("DELETE FROM chunks WHERE file_id = ?1", params![file_id])?;
        Ok(count)
    }

    /// Check whether a file is stored with the given content hash.
    pub fn has_file_hash(&self, file_id: &str, file_hash: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM chunks WHERE file_id = ?1 AND file_hash = ?2)",
            params![file_id, file_hash],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// List every indexed file with its chunk count.
    pub fn list_documents(&self) -> DbResult<Vec<DocumentInfo>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT file_id, MAX(file_path), MAX(file_name), MAX(file_hash), COUNT(*),
                   MIN(created_at), MAX(updated_at)
            FROM chunks
            GROUP BY file_id
            ORDER BY MAX(file_path)
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let chunk_count: i64 = row.get(4)?;
            let created_at: String = row.get(5)?;
            let updated_at: String = row.get(6)?;
            Ok(DocumentInfo {
                file_id: row.get(0)?,
                file_path: row.get(1)?,
                file_name: row.get(2)?,
                file_hash: row.get(3)?,
                chunk_count: chunk_count as usize,
                created_at: parse_timestamp(&created_at),
                updated_at: parse_timestamp(&updated_at),
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Total number of stored chunks.
    pub fn chunk_count(&self) -> DbResult<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count)
    }
}
