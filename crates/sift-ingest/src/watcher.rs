//! File system watcher that keeps the index current.
//!
//! Raw notify events are turned into [`FsEvent`] messages on a channel. A
//! single loop owns the [`PendingChanges`] map, folds bursts of events into
//! one entry per path and, on every poll tick, hands paths that have been
//! quiet for the debounce window to a worker through a bounded queue.

use crate::error::{IngestError, IngestResult};
use crate::pending::PendingChanges;
use crate::pipeline::FileIndexer;
use crate::scope::WatchScope;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// A filesystem change, already stripped of platform detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    /// A file was created or its content changed.
    Changed(PathBuf),
    /// A file was deleted.
    Removed(PathBuf),
    /// A file was renamed.
    Renamed { from: PathBuf, to: PathBuf },
    /// The subscription reported an error.
    Error(String),
}

impl FsEvent {
    /// Translate a notify event. Access and metadata-only events are dropped.
    pub fn from_notify(event: Event) -> Vec<FsEvent> {
        let Event { kind, paths, .. } = event;

        match kind {
            EventKind::Create(_) => paths.into_iter().map(FsEvent::Changed).collect(),
            EventKind::Remove(_) => paths.into_iter().map(FsEvent::Removed).collect(),
            EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() == 2 => {
                let mut paths = paths.into_iter();
                match (paths.next(), paths.next()) {
                    (Some(from), Some(to)) => vec![FsEvent::Renamed { from, to }],
                    _ => Vec::new(),
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                paths.into_iter().map(FsEvent::Removed).collect()
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                paths.into_iter().map(FsEvent::Changed).collect()
            }
            // Platforms that do not say which side of the rename this is.
            EventKind::Modify(ModifyKind::Name(_)) => paths
                .into_iter()
                .map(|p| {
                    if p.exists() {
                        FsEvent::Changed(p)
                    } else {
                        FsEvent::Removed(p)
                    }
                })
                .collect(),
            EventKind::Modify(_) => paths.into_iter().map(FsEvent::Changed).collect(),
            EventKind::Access(_) | EventKind::Any | EventKind::Other => Vec::new(),
        }
    }
}

/// Work handed from the event loop to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkItem {
    Process(PathBuf),
    Remove(PathBuf),
}

/// Timing and queue settings for the watcher.
#[derive(Debug, Clone, Copy)]
pub struct WatcherSettings {
    /// Quiet time required after the last event before a path is processed.
    pub debounce: Duration,
    /// How often pending paths are checked.
    pub poll_interval: Duration,
    /// Capacity of the work queue.
    pub queue_capacity: usize,
}

impl WatcherSettings {
    /// Create from config.
    pub fn from_config(config: &sift_config::WatchConfig) -> Self {
        Self {
            debounce: config.debounce(),
            poll_interval: config.poll_interval(),
            queue_capacity: config.queue_capacity,
        }
    }
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            poll_interval: Duration::from_millis(250),
            queue_capacity: 256,
        }
    }
}

/// Watches the root of a [`WatchScope`] and feeds changes to a [`FileIndexer`].
pub struct ChangeWatcher<I> {
    indexer: Arc<I>,
    scope: WatchScope,
    settings: WatcherSettings,
}

impl<I: FileIndexer + 'static> ChangeWatcher<I> {
    pub fn new(indexer: Arc<I>, scope: WatchScope, settings: WatcherSettings) -> Self {
        Self {
            indexer,
            scope,
            settings,
        }
    }

    /// Reconcile the index, then watch until `shutdown` turns true.
    ///
    /// The subscription starts only after the initial reindex has finished.
    /// A shutdown during the reindex drops it and returns right away.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> IngestResult<()> {
        let root = self.scope.root().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;

        tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown) => {
                info!("Shutdown requested during initial reindex");
                return Ok(());
            }
            indexed = self.indexer.reindex_all() => {
                info!("Initial reindex finished: {} files indexed", indexed?);
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let events = match res {
                Ok(event) => FsEvent::from_notify(event),
                Err(e) => vec![FsEvent::Error(e.to_string())],
            };
            for event in events {
                // The loop has exited; nothing left to notify.
                if tx.send(event).is_err() {
                    break;
                }
            }
        })?;

        let mode = if self.scope.recursive() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(&root, mode)?;
        info!("Watching directory: {:?}", root);

        let result = self.run_loop(rx, shutdown).await;

        drop(watcher);
        info!("Stopped watching {:?}", root);
        result
    }

    /// The event loop, fed from any event source.
    ///
    /// Returns when `shutdown` turns true (or its sender is dropped) or when
    /// the event channel closes. In-flight work finishes; pending paths
    /// that have not yet been handed to the worker are abandoned.
    pub async fn run_loop(
        &self,
        mut events: mpsc::UnboundedReceiver<FsEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> IngestResult<()> {
        let (work_tx, work_rx) = mpsc::channel(self.settings.queue_capacity.max(1));
        let worker = tokio::spawn(run_worker(
            Arc::clone(&self.indexer),
            work_rx,
            shutdown.clone(),
        ));

        let mut pending = PendingChanges::new();
        let mut ticker = interval(self.settings.poll_interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_requested(&mut shutdown) => {
                    debug!("Shutdown requested, abandoning {} pending changes", pending.len());
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event, &mut pending, &work_tx).await,
                    None => break,
                },
                _ = ticker.tick() => {
                    for path in pending.take_ripe(Instant::now(), self.settings.debounce) {
                        enqueue(&work_tx, WorkItem::Process(path)).await;
                    }
                }
            }
        }

        drop(work_tx);
        worker
            .await
            .map_err(|e| IngestError::WatchError(format!("worker task failed: {}", e)))
    }

    async fn handle_event(
        &self,
        event: FsEvent,
        pending: &mut PendingChanges,
        work: &mpsc::Sender<WorkItem>,
    ) {
        match event {
            FsEvent::Changed(path) => self.on_changed(path, pending),
            FsEvent::Removed(path) => self.on_removed(path, pending, work).await,
            FsEvent::Renamed { from, to } => {
                self.on_removed(from, pending, work).await;
                self.on_changed(to, pending);
            }
            FsEvent::Error(message) => error!("Watch error: {}", message),
        }
    }

    fn on_changed(&self, path: PathBuf, pending: &mut PendingChanges) {
        if self.scope.accepts(&path) && !path.is_dir() {
            debug!("File changed: {:?}", path);
            pending.touch(path, Instant::now());
        }
    }

    async fn on_removed(
        &self,
        path: PathBuf,
        pending: &mut PendingChanges,
        work: &mpsc::Sender<WorkItem>,
    ) {
        if self.scope.accepts(&path) {
            debug!("File deleted: {:?}", path);
            pending.remove(&path);
            enqueue(work, WorkItem::Remove(path)).await;
        }
    }
}

/// Resolve once shutdown is signalled or can no longer be signalled.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Put an item on the work queue, waiting if it is full.
async fn enqueue(work: &mpsc::Sender<WorkItem>, item: WorkItem) {
    match work.try_send(item) {
        Ok(()) => {}
        Err(TrySendError::Full(item)) => {
            warn!("Work queue is full, waiting to enqueue {:?}", item);
            if work.send(item).await.is_err() {
                warn!("Work queue closed, dropping work item");
            }
        }
        Err(TrySendError::Closed(item)) => {
            warn!("Work queue closed, dropping {:?}", item);
        }
    }
}

/// Run queued work items one at a time until shutdown or the queue closes.
async fn run_worker<I: FileIndexer>(
    indexer: Arc<I>,
    mut work: mpsc::Receiver<WorkItem>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let item = tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown) => break,
            item = work.recv() => match item {
                Some(item) => item,
                None => break,
            },
        };

        match item {
            WorkItem::Process(path) => match indexer.process_file(&path).await {
                Ok(true) => info!("Reindexed {:?}", path),
                Ok(false) => debug!("No changes to index for {:?}", path),
                Err(e) => warn!("Failed to process {:?}: {}", path, e),
            },
            WorkItem::Remove(path) => {
                if let Err(e) = indexer.remove_file(&path).await {
                    warn!("Failed to remove {:?} from index: {}", path, e);
                }
            }
        }
    }
}
