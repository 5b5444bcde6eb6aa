//! Parse, chunk, embed and store files, and keep the index in step with the
//! watch root.

use crate::chunker::Chunker;
use crate::error::{IngestError, IngestResult};
use crate::fingerprint::{file_id, hash_file, resolve_path};
use crate::parsers::{ParsedDocument, ParserRegistry};
use crate::scope::WatchScope;
use async_trait::async_trait;
use chrono::Utc;
use sift_core::{ChunkMetadata, Embedder, IndexedChunk, VectorStore};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Operations the change watcher drives.
#[async_trait]
pub trait FileIndexer: Send + Sync {
    /// Index or re-index one file. `Ok(false)` means it was skipped.
    async fn process_file(&self, path: &Path) -> IngestResult<bool>;

    /// Drop every chunk of one file, returning how many were removed.
    async fn remove_file(&self, path: &Path) -> IngestResult<usize>;

    /// Converge the index with the files currently on disk.
    async fn reindex_all(&self) -> IngestResult<usize>;
}

/// The ingestion pipeline.
pub struct IngestPipeline {
    parsers: Arc<ParserRegistry>,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    chunker: Chunker,
    scope: WatchScope,
}

impl IngestPipeline {
    pub fn new(
        parsers: Arc<ParserRegistry>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        chunker: Chunker,
        scope: WatchScope,
    ) -> Self {
        Self {
            parsers,
            embedder,
            store,
            chunker,
            scope,
        }
    }

    pub fn scope(&self) -> &WatchScope {
        &self.scope
    }

    /// Index a single file.
    ///
    /// Returns `Ok(false)` without touching the store when the file is
    /// already indexed with the same content, has no parser, or yields no
    /// text. Otherwise every old chunk of the file is replaced.
    pub async fn process_file(&self, path: &Path) -> IngestResult<bool> {
        let file_id = file_id(path);
        let file_hash = hash_file(path).await?;

        if self.store.is_indexed(&file_id, &file_hash).await? {
            debug!("Unchanged, skipping: {:?}", path);
            return Ok(false);
        }

        if self.parsers.for_path(path).is_none() {
            debug!("No parser for {:?}, skipping", path);
            return Ok(false);
        }

        let Some(doc) = self.parse(path).await? else {
            return Ok(false);
        };

        if doc.is_blank() {
            debug!("No text extracted from {:?}, skipping", path);
            return Ok(false);
        }

        let chunks = self.chunker.chunk_document(&doc);
        if chunks.is_empty() {
            debug!("No chunks produced for {:?}, skipping", path);
            return Ok(false);
        }

        let contents: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&contents).await?;
        if vectors.len() != chunks.len() {
            return Err(sift_core::Error::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            ))
            .into());
        }

        let replaced = self.store.delete_by_file_id(&file_id).await?;
        if replaced > 0 {
            debug!("Replacing {} existing chunks for {:?}", replaced, path);
        }

        let resolved = resolve_path(path);
        let file_path = resolved.to_string_lossy().to_string();
        let file_name = resolved
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.clone());
        let now = Utc::now();

        let indexed: Vec<IndexedChunk> = chunks
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(position, (chunk, vector))| {
                let metadata = ChunkMetadata {
                    file_id: file_id.clone(),
                    file_path: file_path.clone(),
                    file_name: file_name.clone(),
                    file_hash: file_hash.clone(),
                    chunk_index: position,
                    page_number: chunk.page_number,
                    created_at: now,
                    updated_at: now,
                    is_active: true,
                };
                IndexedChunk::new(vector, chunk.content, metadata)
            })
            .collect();

        self.store.upsert(&indexed).await?;

        info!("Indexed {} ({} chunks)", file_path, indexed.len());
        Ok(true)
    }

    /// Remove a file from the index.
    pub async fn remove_file(&self, path: &Path) -> IngestResult<usize> {
        let removed = self.store.delete_by_file_id(&file_id(path)).await?;
        if removed > 0 {
            info!("Removed {:?} from index ({} chunks)", path, removed);
        } else {
            debug!("Nothing indexed for {:?}", path);
        }
        Ok(removed)
    }

    /// Reprocess every file under the watch root and drop orphans.
    ///
    /// Per-file failures are logged and skipped. Returns the number of files
    /// that were actually (re)indexed.
    pub async fn reindex_all(&self) -> IngestResult<usize> {
        self.store.ensure_collection().await?;

        let files = self.scope.enumerate();
        info!(
            "Reconciling {} files under {:?}",
            files.len(),
            self.scope.root()
        );

        let mut live: HashSet<String> = HashSet::with_capacity(files.len());
        let mut processed = 0;

        for path in &files {
            live.insert(file_id(path));
            match self.process_file(path).await {
                Ok(true) => processed += 1,
                Ok(false) => {}
                Err(e) => warn!("Failed to index {:?}: {}", path, e),
            }
        }

        let mut orphans = 0;
        for doc in self.store.list_documents().await? {
            if !live.contains(&doc.file_id) {
                warn!("Removing orphaned file from index: {}", doc.file_path);
                self.store.delete_by_file_id(&doc.file_id).await?;
                orphans += 1;
            }
        }

        info!(
            "Reindex complete: {} indexed, {} unchanged or skipped, {} orphans removed",
            processed,
            files.len() - processed,
            orphans
        );

        Ok(processed)
    }

    /// Parse on the blocking pool. `None` if no parser claims the file.
    async fn parse(&self, path: &Path) -> IngestResult<Option<ParsedDocument>> {
        let parsers = Arc::clone(&self.parsers);
        let path: PathBuf = path.to_path_buf();

        tokio::task::spawn_blocking(move || match parsers.for_path(&path) {
            Some(parser) => parser.parse(&path).map(Some),
            None => Ok(None),
        })
        .await
        .map_err(|e| IngestError::ProcessingError(format!("parser task failed: {}", e)))?
    }
}

#[async_trait]
impl FileIndexer for IngestPipeline {
    async fn process_file(&self, path: &Path) -> IngestResult<bool> {
        IngestPipeline::process_file(self, path).await
    }

    async fn remove_file(&self, path: &Path) -> IngestResult<usize> {
        IngestPipeline::remove_file(self, path).await
    }

    async fn reindex_all(&self) -> IngestResult<usize> {
        IngestPipeline::reindex_all(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::ChunkConfig;
    use sift_core::{DocumentInfo, SearchFilter, SearchResult};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    #[derive(Debug, Clone, PartialEq)]
    enum StoreCall {
        EnsureCollection,
        Upsert(String, usize),
        Delete(String),
        List,
        IsIndexed(String),
    }

    impl StoreCall {
        fn is_mutation(&self) -> bool {
            matches!(self, StoreCall::Upsert(..) | StoreCall::Delete(_))
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<StoreCall>>,
        chunks: Mutex<HashMap<String, Vec<IndexedChunk>>>,
    }

    impl RecordingStore {
        fn record(&self, call: StoreCall) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<StoreCall> {
            self.calls.lock().unwrap().clone()
        }

        fn clear_calls(&self) {
            self.calls.lock().unwrap().clear();
        }

        fn file_ids(&self) -> Vec<String> {
            let mut ids: Vec<String> = self.chunks.lock().unwrap().keys().cloned().collect();
            ids.sort();
            ids
        }

        fn chunks_for(&self, file_id: &str) -> Vec<IndexedChunk> {
            self.chunks
                .lock()
                .unwrap()
                .get(file_id)
                .cloned()
                .unwrap_or_default()
        }

        fn seed(&self, file_id: &str, path: &str) {
            let now = Utc::now();
            let chunk = IndexedChunk::new(
                vec![1.0],
                "stale",
                ChunkMetadata {
                    file_id: file_id.to_string(),
                    file_path: path.to_string(),
                    file_name: "stale.txt".to_string(),
                    file_hash: "old".to_string(),
                    chunk_index: 0,
                    page_number: None,
                    created_at: now,
                    updated_at: now,
                    is_active: true,
                },
            );
            self.chunks
                .lock()
                .unwrap()
                .insert(file_id.to_string(), vec![chunk]);
        }
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        async fn ensure_collection(&self) -> sift_core::Result<()> {
            self.record(StoreCall::EnsureCollection);
            Ok(())
        }

        async fn upsert(&self, chunks: &[IndexedChunk]) -> sift_core::Result<()> {
            let file_id = chunks[0].metadata.file_id.clone();
            self.record(StoreCall::Upsert(file_id.clone(), chunks.len()));
            self.chunks
                .lock()
                .unwrap()
                .entry(file_id)
                .or_default()
                .extend(chunks.iter().cloned());
            Ok(())
        }

        async fn delete_by_file_id(&self, file_id: &str) -> sift_core::Result<usize> {
            self.record(StoreCall::Delete(file_id.to_string()));
            Ok(self
                .chunks
                .lock()
                .unwrap()
                .remove(file_id)
                .map(|c| c.len())
                .unwrap_or(0))
        }

        async fn search(
            &self,
            _vector: &[f32],
            _top_k: usize,
            _filter: &SearchFilter,
        ) -> sift_core::Result<Vec<SearchResult>> {
            Ok(Vec::new())
        }

        async fn list_documents(&self) -> sift_core::Result<Vec<DocumentInfo>> {
            self.record(StoreCall::List);
            let chunks = self.chunks.lock().unwrap();
            Ok(chunks
                .iter()
                .map(|(id, c)| DocumentInfo {
                    file_id: id.clone(),
                    file_path: c[0].metadata.file_path.clone(),
                    file_name: c[0].metadata.file_name.clone(),
                    file_hash: c[0].metadata.file_hash.clone(),
                    chunk_count: c.len(),
                    created_at: c[0].metadata.created_at,
                    updated_at: c[0].metadata.updated_at,
                })
                .collect())
        }

        async fn is_indexed(&self, file_id: &str, file_hash: &str) -> sift_core::Result<bool> {
            self.record(StoreCall::IsIndexed(file_id.to_string()));
            Ok(self
                .chunks
                .lock()
                .unwrap()
                .get(file_id)
                .map(|c| c.iter().all(|chunk| chunk.metadata.file_hash == file_hash))
                .unwrap_or(false))
        }
    }

    /// Embeds text as `[char count, 1.0]`; fails on any text containing "FAIL".
    #[derive(Default)]
    struct FakeEmbedder {
        batches: Mutex<usize>,
        short_by_one: bool,
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, text: &str) -> sift_core::Result<Vec<f32>> {
            Ok(vec![text.chars().count() as f32, 1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> sift_core::Result<Vec<Vec<f32>>> {
            *self.batches.lock().unwrap() += 1;
            if texts.iter().any(|t| t.contains("FAIL")) {
                return Err(sift_core::Error::Embedding("model exploded".to_string()));
            }
            let mut vectors: Vec<Vec<f32>> = texts
                .iter()
                .map(|t| vec![t.chars().count() as f32, 1.0])
                .collect();
            if self.short_by_one {
                vectors.pop();
            }
            Ok(vectors)
        }
    }

    struct Fixture {
        dir: TempDir,
        store: Arc<RecordingStore>,
        embedder: Arc<FakeEmbedder>,
        pipeline: IngestPipeline,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_embedder(FakeEmbedder::default(), true)
        }

        fn with_embedder(embedder: FakeEmbedder, recursive: bool) -> Self {
            let dir = tempdir().unwrap();
            let store = Arc::new(RecordingStore::default());
            let embedder = Arc::new(embedder);
            let chunker = Chunker::new(ChunkConfig {
                chunk_size: 40,
                chunk_overlap: 10,
            })
            .unwrap();
            let extensions: Vec<String> = ["txt", "md", "bin"].iter().map(|s| s.to_string()).collect();
            let scope = WatchScope::new(dir.path(), recursive, &extensions, &["*.tmp".to_string()]);

            let pipeline = IngestPipeline::new(
                Arc::new(ParserRegistry::with_defaults()),
                embedder.clone(),
                store.clone(),
                chunker,
                scope,
            );

            Self {
                dir,
                store,
                embedder,
                pipeline,
            }
        }

        fn write(&self, name: &str, content: &str) -> PathBuf {
            let path = self.dir.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&path, content).unwrap();
            path
        }
    }

    const LONG_TEXT: &str = "The quarterly report is due on Friday. Finance reviews it on Monday. \
                             Legal signs off by Wednesday of the following week.";

    #[tokio::test]
    async fn test_process_new_file() {
        let fx = Fixture::new();
        let path = fx.write("report.txt", LONG_TEXT);

        assert!(fx.pipeline.process_file(&path).await.unwrap());

        let id = file_id(&path);
        let stored = fx.store.chunks_for(&id);
        assert!(stored.len() > 1);
        for (i, chunk) in stored.iter().enumerate() {
            assert_eq!(chunk.metadata.chunk_index, i);
            assert_eq!(chunk.metadata.file_name, "report.txt");
            assert!(chunk.metadata.is_active);
            assert_eq!(chunk.metadata.created_at, chunk.metadata.updated_at);
            assert_eq!(chunk.vector[0], chunk.content.chars().count() as f32);
        }

        let calls = fx.store.calls();
        assert_eq!(calls.last(), Some(&StoreCall::Upsert(id.clone(), stored.len())));
        assert_eq!(calls.iter().filter(|c| matches!(c, StoreCall::Upsert(..))).count(), 1);
        assert_eq!(*fx.embedder.batches.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_file_is_noop() {
        let fx = Fixture::new();
        let path = fx.write("report.txt", LONG_TEXT);
        assert!(fx.pipeline.process_file(&path).await.unwrap());
        fx.store.clear_calls();

        assert!(!fx.pipeline.process_file(&path).await.unwrap());

        assert!(!fx.store.calls().iter().any(StoreCall::is_mutation));
        assert_eq!(*fx.embedder.batches.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_changed_file_deletes_before_upsert() {
        let fx = Fixture::new();
        let path = fx.write("report.txt", LONG_TEXT);
        fx.pipeline.process_file(&path).await.unwrap();
        let old_ids: Vec<String> = fx
            .store
            .chunks_for(&file_id(&path))
            .into_iter()
            .map(|c| c.id)
            .collect();
        fx.store.clear_calls();

        std::fs::write(&path, "A completely different body of text.").unwrap();
        assert!(fx.pipeline.process_file(&path).await.unwrap());

        let id = file_id(&path);
        let mutations: Vec<StoreCall> = fx
            .store
            .calls()
            .into_iter()
            .filter(StoreCall::is_mutation)
            .collect();
        assert_eq!(
            mutations,
            vec![StoreCall::Delete(id.clone()), StoreCall::Upsert(id.clone(), 1)]
        );

        let stored = fx.store.chunks_for(&id);
        assert_eq!(stored.len(), 1);
        assert!(!old_ids.contains(&stored[0].id));
    }

    #[tokio::test]
    async fn test_skips_without_store_mutation() {
        let fx = Fixture::new();

        // No parser for .bin, even though the scope accepts it.
        let binary = fx.write("blob.bin", "data");
        assert!(!fx.pipeline.process_file(&binary).await.unwrap());

        let empty = fx.write("empty.txt", "  \n\t ");
        assert!(!fx.pipeline.process_file(&empty).await.unwrap());

        assert!(!fx.store.calls().iter().any(StoreCall::is_mutation));
        assert_eq!(*fx.embedder.batches.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let fx = Fixture::new();
        let result = fx
            .pipeline
            .process_file(&fx.dir.path().join("missing.txt"))
            .await;
        assert!(matches!(result, Err(IngestError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_embedding_count_mismatch() {
        let fx = Fixture::with_embedder(
            FakeEmbedder {
                short_by_one: true,
                ..Default::default()
            },
            true,
        );
        let path = fx.write("report.txt", LONG_TEXT);

        let result = fx.pipeline.process_file(&path).await;
        assert!(matches!(
            result,
            Err(IngestError::Collaborator(sift_core::Error::Embedding(_)))
        ));
        assert!(!fx.store.calls().iter().any(StoreCall::is_mutation));
    }

    #[tokio::test]
    async fn test_remove_file() {
        let fx = Fixture::new();
        let path = fx.write("report.txt", LONG_TEXT);
        fx.pipeline.process_file(&path).await.unwrap();
        let count = fx.store.chunks_for(&file_id(&path)).len();

        std::fs::remove_file(&path).unwrap();
        assert_eq!(fx.pipeline.remove_file(&path).await.unwrap(), count);
        assert_eq!(fx.pipeline.remove_file(&path).await.unwrap(), 0);
        assert!(fx.store.file_ids().is_empty());
    }

    #[tokio::test]
    async fn test_reindex_all_with_orphans_and_failures() {
        let fx = Fixture::new();
        let a = fx.write("a.txt", "Alpha document.");
        let b = fx.write("nested/b.md", "# Beta\n\nBeta document.");
        let broken = fx.write("broken.txt", "This one will FAIL to embed.");
        fx.write("scratch.tmp", "ignored by pattern");
        fx.write(".hidden.txt", "hidden");
        fx.store.seed("orphan-id", "/gone/old.txt");

        let processed = fx.pipeline.reindex_all().await.unwrap();

        assert_eq!(processed, 2);
        let mut expected = vec![file_id(&a), file_id(&b)];
        expected.sort();
        assert_eq!(fx.store.file_ids(), expected);
        assert!(fx.store.chunks_for(&file_id(&broken)).is_empty());

        let calls = fx.store.calls();
        assert_eq!(calls.first(), Some(&StoreCall::EnsureCollection));
        assert!(calls.contains(&StoreCall::Delete("orphan-id".to_string())));

        // A second pass changes nothing.
        fx.store.clear_calls();
        assert_eq!(fx.pipeline.reindex_all().await.unwrap(), 0);
        assert!(!fx
            .store
            .calls()
            .iter()
            .any(|c| matches!(c, StoreCall::Upsert(..))));
    }

    #[tokio::test]
    async fn test_reindex_non_recursive() {
        let fx = Fixture::with_embedder(FakeEmbedder::default(), false);
        let top = fx.write("top.txt", "Top level.");
        fx.write("sub/deep.txt", "Nested file.");

        assert_eq!(fx.pipeline.reindex_all().await.unwrap(), 1);
        assert_eq!(fx.store.file_ids(), vec![file_id(&top)]);
    }

    #[tokio::test]
    async fn test_reindex_missing_root_clears_index() {
        let fx = Fixture::new();
        let path = fx.write("a.txt", "Alpha document.");
        fx.pipeline.process_file(&path).await.unwrap();
        fx.store.seed("other", "/elsewhere/x.txt");

        std::fs::remove_dir_all(fx.dir.path()).unwrap();

        assert_eq!(fx.pipeline.reindex_all().await.unwrap(), 0);
        assert!(fx.store.file_ids().is_empty());
    }
}
