//! CLI command implementations.

pub mod ask;
pub mod config;
pub mod index;
pub mod init;
pub mod remove;
pub mod status;
pub mod watch;

use anyhow::{Context, Result};
use sift_config::{AppPaths, Config};
use sift_db::Database;
use sift_ingest::{ChunkConfig, Chunker, IngestPipeline, ParserRegistry, WatchScope};
use sift_ollama::{OllamaClient, OllamaEmbedder};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Get the application paths.
pub fn get_paths() -> Result<AppPaths> {
    AppPaths::new().context("Failed to determine application directories")
}

/// Load the configuration and the paths it resolves to.
///
/// `general.data_dir`, when set, moves the database and logs.
pub fn load_context() -> Result<(AppPaths, Config)> {
    let paths = get_paths()?;
    let config = Config::load_from(&paths.config_file).context("Failed to load configuration")?;
    let paths = apply_data_dir(paths, &config);
    Ok((paths, config))
}

fn apply_data_dir(paths: AppPaths, config: &Config) -> AppPaths {
    match config.general.data_dir.as_deref() {
        Some(dir) if !dir.trim().is_empty() => {
            let data_dir = PathBuf::from(shellexpand::tilde(dir).as_ref());
            AppPaths::with_dirs(paths.config_dir, data_dir)
        }
        _ => paths,
    }
}

/// Open the index database, ensuring sift is initialized.
pub fn open_database(paths: &AppPaths) -> Result<Database> {
    if !paths.is_initialized() {
        anyhow::bail!("Sift is not initialized. Run 'sift init' first.");
    }

    Database::open(&paths.database_file).context("Failed to open database")
}

/// Create the async runtime commands block on.
pub fn runtime() -> Result<Runtime> {
    Runtime::new().context("Failed to create async runtime")
}

/// Fail early with a helpful message when Ollama is down.
pub fn ensure_ollama(rt: &Runtime, config: &Config) -> Result<OllamaClient> {
    let client =
        OllamaClient::from_config(&config.ollama).context("Failed to create Ollama client")?;

    if !rt.block_on(client.is_available()) {
        anyhow::bail!(
            "Ollama is not running at {}. Start it with 'ollama serve'.",
            config.ollama.host
        );
    }

    Ok(client)
}

/// Wire the ingestion pipeline to SQLite and Ollama.
pub fn build_pipeline(
    config: &Config,
    db: Database,
    client: OllamaClient,
) -> Result<IngestPipeline> {
    let chunker = Chunker::new(ChunkConfig::from_config(&config.chunking))
        .context("Invalid chunking configuration")?;
    let embedder = OllamaEmbedder::new(client, config.ollama.embedding_model.clone());

    Ok(IngestPipeline::new(
        Arc::new(ParserRegistry::with_defaults()),
        Arc::new(embedder),
        Arc::new(db),
        chunker,
        WatchScope::from_config(&config.watch),
    ))
}

/// Format a file size in human-readable form.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
