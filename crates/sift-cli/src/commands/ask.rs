//! Ask command - grounded question answering.

use super::{ensure_ollama, load_context, open_database, runtime};
use anyhow::{Context, Result};
use colored::Colorize;
use sift_ingest::fingerprint::resolve_path;
use sift_ollama::{OllamaEmbedder, OllamaGenerator};
use sift_rag::{RagEngine, RagQuery, RagResponse};
use std::path::Path;
use std::sync::Arc;

/// Per-question overrides from the command line.
pub struct AskOptions {
    pub top_k: Option<usize>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub paths: Vec<String>,
    pub conversation: Option<String>,
    pub show_sources: bool,
}

/// Run the ask command.
pub fn run(question: &str, options: AskOptions) -> Result<()> {
    let (paths, config) = load_context()?;
    let db = open_database(&paths)?;
    let rt = runtime()?;
    let client = ensure_ollama(&rt, &config)?;

    let engine = RagEngine::new(
        Arc::new(OllamaEmbedder::new(
            client.clone(),
            config.ollama.embedding_model.clone(),
        )),
        Arc::new(db),
        Arc::new(OllamaGenerator::new(client, config.ollama.model.clone())),
        &config.rag,
    )
    .context("Invalid rag configuration")?;

    let query = build_query(question, &options);

    println!("{} {}", "Question:".cyan().bold(), question);
    println!("{}", "─".repeat(70));
    println!();

    let response = rt
        .block_on(engine.query(query))
        .context("Failed to answer question")?;

    print_response(&response, options.show_sources);
    Ok(())
}

fn build_query(question: &str, options: &AskOptions) -> RagQuery {
    let mut query = RagQuery::new(question).with_file_filters(
        options
            .paths
            .iter()
            .map(|p| path_prefix(p))
            .collect(),
    );

    if let Some(top_k) = options.top_k {
        query = query.with_top_k(top_k);
    }
    if let Some(temperature) = options.temperature {
        query = query.with_temperature(temperature);
    }
    if let Some(max_tokens) = options.max_tokens {
        query = query.with_max_tokens(max_tokens);
    }
    if let Some(id) = &options.conversation {
        query = query.with_conversation_id(id.clone());
    }

    query
}

/// Indexed paths are absolute, so filters are made absolute the same way.
fn path_prefix(raw: &str) -> String {
    let expanded = shellexpand::tilde(raw);
    resolve_path(Path::new(expanded.as_ref()))
        .to_string_lossy()
        .to_string()
}

fn print_response(response: &RagResponse, show_sources: bool) {
    println!("{}", "Answer:".green().bold());
    println!();
    println!("{}", response.answer);
    println!();

    if show_sources && !response.sources.is_empty() {
        println!("{}", "─".repeat(70));
        println!("{}", "Sources:".cyan().bold());
        for (i, source) in response.sources.iter().enumerate() {
            let location = match source.page_number {
                Some(page) => format!("page {}, chunk {}", page, source.chunk_index),
                None => format!("chunk {}", source.chunk_index),
            };
            println!(
                "  {}. {} {} (relevance: {:.0}%)",
                i + 1,
                source.file_name.white(),
                format!("[{}]", location).dimmed(),
                source.score * 100.0
            );
            println!("     {}", source.file_path.dimmed());
        }
        println!();
    }

    let mut footer = format!(
        "{} · {}ms",
        response.meta.model, response.meta.latency_ms
    );
    if response.meta.guardrails_applied {
        footer.push_str(" · guardrails applied");
    }
    if let Some(id) = &response.meta.conversation_id {
        footer.push_str(&format!(" · conversation {}", id));
    }
    println!("{}", footer.dimmed());
}
