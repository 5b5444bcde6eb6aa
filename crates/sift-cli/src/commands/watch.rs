//! Watch command - keep the index current until Ctrl+C.

use super::{build_pipeline, ensure_ollama, load_context, open_database, runtime};
use anyhow::{Context, Result};
use colored::Colorize;
use sift_ingest::{ChangeWatcher, WatcherSettings};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Start the file watcher in the foreground.
pub fn run() -> Result<()> {
    let (paths, config) = load_context()?;
    let db = open_database(&paths)?;
    let rt = runtime()?;
    let client = ensure_ollama(&rt, &config)?;

    let pipeline = Arc::new(build_pipeline(&config, db, client)?);
    let scope = pipeline.scope().clone();
    let settings = WatcherSettings::from_config(&config.watch);

    println!("{}", "Starting file watcher...".cyan());
    println!(
        "  {} {}{}",
        "+".green(),
        scope.root().display(),
        if scope.recursive() { " (recursive)" } else { "" }
    );
    println!(
        "  Debounce: {}ms, poll: {}ms",
        settings.debounce.as_millis(),
        settings.poll_interval.as_millis()
    );
    println!("\nPress Ctrl+C to stop.\n");

    let watcher = ChangeWatcher::new(pipeline, scope, settings);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    rt.block_on(async move {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C, shutting down");
                let _ = shutdown_tx.send(true);
            }
        });

        watcher.run(shutdown_rx).await
    })
    .context("File watcher failed")?;

    println!("{}", "Watcher stopped.".yellow());
    Ok(())
}
