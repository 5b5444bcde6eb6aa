//! Remove command - drop one file from the index.

use super::{build_pipeline, load_context, open_database, runtime};
use anyhow::{Context, Result};
use colored::Colorize;
use sift_ollama::OllamaClient;
use std::path::Path;

pub fn run(path: &Path) -> Result<()> {
    let (paths, config) = load_context()?;
    let db = open_database(&paths)?;
    let rt = runtime()?;

    // Removal never embeds, so a down server is fine here
    let client =
        OllamaClient::from_config(&config.ollama).context("Failed to create Ollama client")?;
    let pipeline = build_pipeline(&config, db, client)?;

    let removed = rt
        .block_on(pipeline.remove_file(path))
        .context("Failed to remove file from index")?;

    if removed == 0 {
        println!(
            "{} {} is not in the index",
            "Note:".yellow(),
            path.display()
        );
    } else {
        println!(
            "{} Removed {} ({} chunks)",
            "✓".green(),
            path.display(),
            removed
        );
    }

    Ok(())
}
