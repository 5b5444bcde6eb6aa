//! Index command - reconcile the index with the watched folder once.

use super::{build_pipeline, ensure_ollama, load_context, open_database, runtime};
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn run() -> Result<()> {
    let (paths, config) = load_context()?;
    let db = open_database(&paths)?;
    let rt = runtime()?;
    let client = ensure_ollama(&rt, &config)?;
    let pipeline = build_pipeline(&config, db.clone(), client)?;

    println!(
        "{} {}",
        "Indexing".cyan().bold(),
        pipeline.scope().root().display()
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Parsing, chunking and embedding...");
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = rt.block_on(pipeline.reindex_all());
    spinner.finish_and_clear();
    let indexed = result.context("Reindex failed")?;

    let documents = db.list_documents().context("Failed to list documents")?;
    let chunks = db.chunk_count().context("Failed to count chunks")?;

    println!(
        "{} {} files (re)indexed, {} documents / {} chunks in the index",
        "✓".green(),
        indexed,
        documents.len(),
        chunks
    );

    Ok(())
}
