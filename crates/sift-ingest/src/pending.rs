//! Debounce bookkeeping for the change watcher.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;

/// Paths with unprocessed changes, keyed to the time of their latest event.
///
/// Owned by the watcher loop; a burst of events for one path keeps a single
/// entry whose timestamp moves forward with every event.
#[derive(Debug, Default)]
pub struct PendingChanges {
    entries: HashMap<PathBuf, Instant>,
}

impl PendingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event for `path` at `now`, replacing any earlier timestamp.
    pub fn touch(&mut self, path: PathBuf, now: Instant) {
        self.entries.insert(path, now);
    }

    /// Forget a path. Returns whether it was pending.
    pub fn remove(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Remove and return every path idle for at least `debounce`, sorted.
    pub fn take_ripe(&mut self, now: Instant, debounce: Duration) -> Vec<PathBuf> {
        let mut ripe: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|(_, last)| now.saturating_duration_since(**last) >= debounce)
            .map(|(path, _)| path.clone())
            .collect();

        for path in &ripe {
            self.entries.remove(path);
        }

        ripe.sort();
        ripe
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(500);

    #[test]
    fn test_burst_collapses_to_one_entry() {
        let start = Instant::now();
        let mut pending = PendingChanges::new();

        for i in 0..10 {
            pending.touch(PathBuf::from("/docs/a.txt"), start + Duration::from_millis(i * 50));
        }
        assert_eq!(pending.len(), 1);

        // 450ms after the last touch: not yet ripe.
        assert!(pending
            .take_ripe(start + Duration::from_millis(900), DEBOUNCE)
            .is_empty());

        let ripe = pending.take_ripe(start + Duration::from_millis(950), DEBOUNCE);
        assert_eq!(ripe, vec![PathBuf::from("/docs/a.txt")]);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_only_idle_paths_are_taken() {
        let start = Instant::now();
        let mut pending = PendingChanges::new();
        pending.touch(PathBuf::from("/docs/b.txt"), start);
        pending.touch(PathBuf::from("/docs/a.txt"), start);
        pending.touch(PathBuf::from("/docs/c.txt"), start + Duration::from_millis(400));

        let ripe = pending.take_ripe(start + DEBOUNCE, DEBOUNCE);
        assert_eq!(
            ripe,
            vec![PathBuf::from("/docs/a.txt"), PathBuf::from("/docs/b.txt")]
        );
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut pending = PendingChanges::new();
        pending.touch(PathBuf::from("/docs/a.txt"), Instant::now());

        assert!(pending.remove(Path::new("/docs/a.txt")));
        assert!(!pending.remove(Path::new("/docs/a.txt")));
        assert!(pending.is_empty());
    }
}
