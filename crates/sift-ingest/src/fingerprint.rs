//! File identity and content hashing.

use crate::error::{IngestError, IngestResult};
use sha2::{Digest, Sha256};
use sift_core::{FileHash, FileId};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Resolve a path to an absolute, symlink-free form.
///
/// A file that no longer exists is resolved through its parent directory, so
/// a deleted file maps to the same id it had while it existed.
pub fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    if let (Some(parent), Some(name)) = (absolute.parent(), absolute.file_name()) {
        if let Ok(parent) = parent.canonicalize() {
            return parent.join(name);
        }
    }

    absolute
}

/// Deterministic id of a file: SHA-256 of its lower-cased resolved path.
pub fn file_id(path: &Path) -> FileId {
    let normalized = resolve_path(path).to_string_lossy().to_lowercase();
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

/// SHA-256 of a file's content, read in fixed-size blocks.
pub async fn hash_file(path: &Path) -> IngestResult<FileHash> {
    let mut file = tokio::fs::File::open(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => IngestError::FileNotFound(path.to_path_buf()),
        _ => IngestError::Io(e),
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_hash_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "hello world").unwrap();

        let hash = hash_file(&path).await.unwrap();
        assert_eq!(
            hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[tokio::test]
    async fn test_hash_large_file_spans_buffers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.log");
        let data = vec![b'x'; READ_BUFFER_SIZE * 3 + 17];
        std::fs::write(&path, &data).unwrap();

        let hash = hash_file(&path).await.unwrap();
        assert_eq!(hash, hex::encode(Sha256::digest(&data)));
    }

    #[tokio::test]
    async fn test_hash_missing_file() {
        let dir = tempdir().unwrap();
        let result = hash_file(&dir.path().join("missing.txt")).await;
        assert!(matches!(result, Err(IngestError::FileNotFound(_))));
    }

    #[test]
    fn test_file_id_is_stable_and_case_insensitive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Report.TXT");
        std::fs::write(&path, "x").unwrap();

        let id = file_id(&path);
        assert_eq!(id.len(), 64);
        assert_eq!(id, file_id(&path));

        let lower = resolve_path(&path).to_string_lossy().to_lowercase();
        assert_eq!(id, hex::encode(Sha256::digest(lower.as_bytes())));
    }

    #[test]
    fn test_file_id_survives_deletion() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone.md");
        std::fs::write(&path, "x").unwrap();

        let before = file_id(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(file_id(&path), before);
    }

    #[test]
    fn test_different_paths_differ() {
        let dir = tempdir().unwrap();
        assert_ne!(
            file_id(&dir.path().join("a.txt")),
            file_id(&dir.path().join("b.txt"))
        );
    }
}
