//! Sift Ingest - keeps the vector index in step with a watched directory.
//!
//! This crate provides:
//! - Boundary-aware text chunking with overlap
//! - Document parsing (text, markdown, PDF)
//! - The parse → chunk → embed → store pipeline with hash-based dedup
//! - Directory reconciliation with orphan removal
//! - A debounced file system watcher

mod chunker;
mod error;
pub mod fingerprint;
pub mod parsers;
mod pending;
mod pipeline;
mod scope;
mod watcher;

pub use chunker::{ChunkConfig, Chunker, BOUNDARY_WINDOW};
pub use error::{IngestError, IngestResult};
pub use parsers::{DocumentParser, ParsedDocument, ParserRegistry};
pub use pending::PendingChanges;
pub use pipeline::{FileIndexer, IngestPipeline};
pub use scope::WatchScope;
pub use watcher::{ChangeWatcher, FsEvent, WatcherSettings, WorkItem};
