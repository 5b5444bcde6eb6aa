//! Which files under the watch root belong in the index.

use glob::Pattern;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// The set of files the index mirrors: a root directory, a recursion flag,
/// an extension allow-list and ignore globs. Hidden files, and anything
/// inside a hidden directory below the root, never match.
#[derive(Debug, Clone)]
pub struct WatchScope {
    root: PathBuf,
    recursive: bool,
    extensions: HashSet<String>,
    ignore_patterns: Vec<Pattern>,
}

impl WatchScope {
    /// Create a scope. Extensions are matched case-insensitively, with or
    /// without a leading dot.
    pub fn new(
        root: impl Into<PathBuf>,
        recursive: bool,
        extensions: &[String],
        ignore_patterns: &[String],
    ) -> Self {
        let extensions = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        let ignore_patterns = ignore_patterns
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!("Skipping invalid ignore pattern {:?}: {}", p, e);
                    None
                }
            })
            .collect();

        Self {
            root: root.into(),
            recursive,
            extensions,
            ignore_patterns,
        }
    }

    /// Create from config, expanding `~` in the root.
    pub fn from_config(config: &sift_config::WatchConfig) -> Self {
        let root = PathBuf::from(shellexpand::tilde(&config.root).as_ref());
        Self::new(
            root,
            config.recursive,
            &config.extensions,
            &config.ignore_patterns,
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    /// Check whether a path has a supported extension and is not ignored.
    pub fn accepts(&self, path: &Path) -> bool {
        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&e.to_lowercase()))
            .unwrap_or(false);

        supported && !self.should_ignore(path)
    }

    /// Check if a path should be ignored.
    pub fn should_ignore(&self, path: &Path) -> bool {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            return true;
        };

        if self.is_hidden(path) {
            return true;
        }

        let path_str = path.to_string_lossy();
        self.ignore_patterns
            .iter()
            .any(|p| p.matches(filename) || p.matches(&path_str))
    }

    /// A path is hidden when any component below the root starts with a dot.
    /// Paths outside the root only have their file name checked.
    fn is_hidden(&self, path: &Path) -> bool {
        let below_root = match path.strip_prefix(&self.root) {
            Ok(relative) => relative,
            Err(_) => path.file_name().map(Path::new).unwrap_or(path),
        };

        below_root.components().any(|c| match c {
            Component::Normal(name) => name.to_str().map(is_dot_name).unwrap_or(false),
            _ => false,
        })
    }

    /// List every accepted file currently on disk. A missing root yields
    /// an empty list.
    pub fn enumerate(&self) -> Vec<PathBuf> {
        if !self.root.is_dir() {
            debug!("Watch root does not exist: {:?}", self.root);
            return Vec::new();
        }

        let mut walker = WalkDir::new(&self.root).follow_links(true);
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        let mut files: Vec<PathBuf> = walker
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !e.file_name().to_str().map(is_dot_name).unwrap_or(false)
            })
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("Failed to read directory entry: {}", err);
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| self.accepts(p))
            .collect();

        files.sort();
        files
    }
}

fn is_dot_name(name: &str) -> bool {
    name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn scope(root: &Path, recursive: bool) -> WatchScope {
        WatchScope::new(
            root,
            recursive,
            &strings(&["txt", ".MD", "pdf"]),
            &strings(&["*.tmp", "~$*", "*/drafts/*"]),
        )
    }

    #[test]
    fn test_accepts() {
        let scope = scope(Path::new("/docs"), true);

        assert!(scope.accepts(Path::new("/docs/a.txt")));
        assert!(scope.accepts(Path::new("/docs/a.TXT")));
        assert!(scope.accepts(Path::new("/docs/notes.md")));
        assert!(!scope.accepts(Path::new("/docs/song.mp3")));
        assert!(!scope.accepts(Path::new("/docs/Makefile")));
        assert!(!scope.accepts(Path::new("/docs/.hidden.txt")));
        assert!(!scope.accepts(Path::new("/docs/~$report.txt")));
        assert!(!scope.accepts(Path::new("/docs/drafts/plan.txt")));
    }

    #[test]
    fn test_should_ignore() {
        let scope = scope(Path::new("/docs"), true);

        assert!(scope.should_ignore(Path::new("/foo/bar/.hidden")));
        assert!(scope.should_ignore(Path::new("/foo/bar/file.tmp")));
        assert!(!scope.should_ignore(Path::new("/foo/bar/file.txt")));
    }

    #[test]
    fn test_enumerate() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join("a.txt"), "a").unwrap();
        std::fs::write(root.join("b.md"), "b").unwrap();
        std::fs::write(root.join("c.bin"), "c").unwrap();
        std::fs::write(root.join("sub").join("d.txt"), "d").unwrap();
        std::fs::write(root.join(".git").join("e.txt"), "e").unwrap();

        let names = |files: Vec<PathBuf>| -> Vec<String> {
            files
                .iter()
                .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
                .collect()
        };

        assert_eq!(
            names(scope(root, true).enumerate()),
            vec!["a.txt", "b.md", "sub/d.txt"]
        );
        assert_eq!(names(scope(root, false).enumerate()), vec!["a.txt", "b.md"]);
    }

    #[test]
    fn test_hidden_directories_are_out_of_scope() {
        let scope = scope(Path::new("/docs"), true);

        assert!(!scope.accepts(Path::new("/docs/.git/notes.txt")));
        assert!(!scope.accepts(Path::new("/docs/sub/.obsidian/cache.md")));
        assert!(scope.accepts(Path::new("/docs/sub/notes.txt")));
    }

    #[test]
    fn test_hidden_root_is_allowed() {
        let scope = scope(Path::new("/home/me/.notes"), true);
        assert!(scope.accepts(Path::new("/home/me/.notes/todo.txt")));
        assert!(!scope.accepts(Path::new("/home/me/.notes/.trash/todo.txt")));
    }

    #[test]
    fn test_accepts_agrees_with_enumerate() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::create_dir_all(root.join("sub").join(".cache")).unwrap();
        std::fs::write(root.join("a.txt"), "a").unwrap();
        std::fs::write(root.join(".git").join("notes.txt"), "n").unwrap();
        std::fs::write(root.join("sub").join(".cache").join("c.md"), "c").unwrap();

        let scope = scope(root, true);
        let listed = scope.enumerate();
        for path in [
            root.join("a.txt"),
            root.join(".git").join("notes.txt"),
            root.join("sub").join(".cache").join("c.md"),
        ] {
            assert_eq!(scope.accepts(&path), listed.contains(&path), "{:?}", path);
        }
    }

    #[test]
    fn test_enumerate_missing_root() {
        let dir = tempdir().unwrap();
        let scope = scope(&dir.path().join("nope"), true);
        assert!(scope.enumerate().is_empty());
    }
}
