//! [`VectorStore`] implementation backed by the SQLite chunk table.

use crate::database::Database;
use crate::error::{DbError, DbResult};
use async_trait::async_trait;
use sift_core::{DocumentInfo, Error, IndexedChunk, Result, SearchFilter, SearchResult, VectorStore};
use tracing::debug;

impl Database {
    /// Run a blocking database call on the blocking thread pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Database) -> DbResult<T> + Send + 'static,
    {
        let db = self.clone();
        let result = match tokio::task::spawn_blocking(move || f(db)).await {
            Ok(result) => result,
            Err(e) => Err(DbError::Task(e.to_string())),
        };
        result.map_err(Error::from)
    }
}

#[async_trait]
impl VectorStore for Database {
    async fn ensure_collection(&self) -> Result<()> {
        self.blocking(|db| db.ensure_schema()).await
    }

    async fn upsert(&self, chunks: &[IndexedChunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let chunks = chunks.to_vec();
        debug!("Storing {} chunks", chunks.len());
        self.blocking(move |db| db.insert_chunks(&chunks)).await
    }

    async fn delete_by_file_id(&self, file_id: &str) -> Result<usize> {
        let file_id = file_id.to_string();
        self.blocking(move |db| db.delete_chunks_by_file(&file_id))
            .await
    }

    async fn search(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchResult>> {
        let vector = vector.to_vec();
        let filter = filter.clone();
        self.blocking(move |db| db.vector_search(&vector, top_k, &filter))
            .await
    }

    async fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
        self.blocking(|db| db.list_documents()).await
    }

    async fn is_indexed(&self, file_id: &str, file_hash: &str) -> Result<bool> {
        let file_id = file_id.to_string();
        let file_hash = file_hash.to_string();
        self.blocking(move |db| db.has_file_hash(&file_id, &file_hash))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::chunks::tests::chunk;

    #[tokio::test]
    async fn test_store_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        let store: &dyn VectorStore = &db;

        store.ensure_collection().await.unwrap();
        store
            .upsert(&[
                chunk("f1", "/docs/a.txt", "h1", 0, vec![1.0, 0.0]),
                chunk("f1", "/docs/a.txt", "h1", 1, vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        assert!(store.is_indexed("f1", "h1").await.unwrap());
        assert!(!store.is_indexed("f1", "other").await.unwrap());

        let results = store
            .search(&[1.0, 0.0], 1, &SearchFilter::active())
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metadata.chunk_index, 0);

        let docs = store.list_documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].chunk_count, 2);

        assert_eq!(store.delete_by_file_id("f1").await.unwrap(), 2);
        assert_eq!(store.delete_by_file_id("f1").await.unwrap(), 0);
        assert!(store.list_documents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_empty_is_noop() {
        let db = Database::open_in_memory().unwrap();
        db.upsert(&[]).await.unwrap();
        assert_eq!(db.chunk_count().unwrap(), 0);
    }
}
