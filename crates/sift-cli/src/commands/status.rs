//! Status command - show what is indexed.

use super::{format_size, load_context, open_database, runtime};
use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use sift_config::Config;
use sift_core::DocumentInfo;
use sift_db::Database;
use sift_ollama::OllamaClient;

pub fn run() -> Result<()> {
    let (paths, config) = load_context()?;
    let db = open_database(&paths)?;

    println!("{}", "Sift Status".cyan().bold());
    println!("{}", "─".repeat(70));
    println!();
    println!("  Watch folder: {}", config.watch.root);
    println!("  Database:     {}", paths.database_file.display());
    println!(
        "  Size:         {}",
        format_size(Database::file_size(&paths.database_file).unwrap_or(0))
    );
    let integrity = if db.integrity_check().context("Integrity check failed")? {
        "ok".green()
    } else {
        "damaged (remove it, then run 'sift init' and 'sift index')".red()
    };
    println!("  Integrity:    {}", integrity);
    print_ollama(&config)?;

    let documents = db.list_documents().context("Failed to list documents")?;
    let chunks = db.chunk_count().context("Failed to count chunks")?;

    println!();
    if documents.is_empty() {
        println!(
            "{}",
            "Nothing indexed yet. Run 'sift index' or 'sift watch'.".dimmed()
        );
        return Ok(());
    }

    println!(
        "{} ({} documents, {} chunks)",
        "Indexed Documents".white().bold(),
        documents.len(),
        chunks
    );
    for doc in &documents {
        print_document(doc);
    }

    Ok(())
}

fn print_document(doc: &DocumentInfo) {
    println!(
        "  {} {} {} {}",
        "•".dimmed(),
        doc.file_name.white(),
        format!("{} chunks", doc.chunk_count).cyan(),
        doc.updated_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
    );
    println!("    {}", doc.file_path.dimmed());
}

fn print_ollama(config: &Config) -> Result<()> {
    let rt = runtime()?;
    let client =
        OllamaClient::from_config(&config.ollama).context("Failed to create Ollama client")?;

    if !rt.block_on(client.is_available()) {
        println!("  Ollama:       {} at {}", "not running".red(), client.host());
        println!(
            "  Models:       {} (answers), {} (embeddings)",
            config.ollama.model, config.ollama.embedding_model
        );
        return Ok(());
    }

    println!("  Ollama:       {} at {}", "running".green(), client.host());
    for (label, model) in [
        ("Chat model:", &config.ollama.model),
        ("Embed model:", &config.ollama.embedding_model),
    ] {
        let state = model_state(rt.block_on(client.has_model(model)), model);
        println!("  {:<14}{} ({})", label, model, state);
    }

    Ok(())
}

fn model_state(found: sift_ollama::OllamaResult<bool>, model: &str) -> ColoredString {
    match found {
        Ok(true) => "installed".green(),
        Ok(false) => format!("missing, run 'ollama pull {}'", model).yellow(),
        Err(e) => format!("unknown: {}", e).red(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_ollama::OllamaError;

    #[test]
    fn test_model_state() {
        assert_eq!(&*model_state(Ok(true), "m"), "installed");
        assert_eq!(
            &*model_state(Ok(false), "nomic-embed-text"),
            "missing, run 'ollama pull nomic-embed-text'"
        );
        let err = OllamaError::ServerNotRunning {
            host: "http://localhost:11434".to_string(),
        };
        assert!(model_state(Err(err), "m").starts_with("unknown: "));
    }
}
