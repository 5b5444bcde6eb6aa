//! Vector search operations for semantic search.

use crate::database::Database;
use crate::error::DbResult;
use crate::operations::chunks::{bytes_to_vector, metadata_from_row, METADATA_COLUMNS};
use rusqlite::params_from_iter;
use sift_core::{SearchFilter, SearchResult};

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot_product, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    dot_product / denominator
}

/// Build the WHERE clause for a filter. Each prefix binds one numbered parameter.
fn filter_clause(filter: &SearchFilter) -> String {
    let mut conditions = Vec::new();

    if filter.active_only {
        conditions.push("is_active = 1".to_string());
    }

    if !filter.path_prefixes.is_empty() {
        let prefixes: Vec<String> = (1..=filter.path_prefixes.len())
            .map(|n| format!("substr(file_path, 1, length(?{n})) = ?{n}"))
            .collect();
        conditions.push(format!("({})", prefixes.join(" OR ")));
    }

    if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    }
}

impl Database {
    /// Find similar chunks using cosine similarity.
    ///
    /// This performs a brute-force search over every stored vector that
    /// passes `filter`. Scores are clamped into `[0, 1]`.
    pub fn vector_search(
        &self,
        query_vector: &[f32],
        limit: usize,
        filter: &SearchFilter,
    ) -> DbResult<Vec<SearchResult>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, content, vector, dimensions FROM chunks {}",
            METADATA_COLUMNS,
            filter_clause(filter)
        ))?;

        let rows = stmt.query_map(params_from_iter(filter.path_prefixes.iter()), |row| {
            let metadata = metadata_from_row(row, 0)?;
            let content: String = row.get(9)?;
            let vector_bytes: Vec<u8> = row.get(10)?;
            let dimensions: i64 = row.get(11)?;
            Ok((metadata, content, vector_bytes, dimensions))
        })?;

        let mut results = Vec::new();
        for row_result in rows {
            let (metadata, content, vector_bytes, dimensions) = row_result?;
            let vector = bytes_to_vector(&vector_bytes, dimensions as usize);
            let score = cosine_similarity(query_vector, &vector).clamp(0.0, 1.0);

            results.push(SearchResult {
                metadata,
                content,
                score,
            });
        }

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(limit);

        Ok(results)
    }
}
