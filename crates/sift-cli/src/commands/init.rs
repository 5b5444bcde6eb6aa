//! Initialize Sift.

use super::load_context;
use anyhow::{Context, Result};
use colored::Colorize;
use sift_config::Config;
use sift_db::Database;

pub fn run() -> Result<()> {
    let (paths, config) = load_context()?;

    if paths.is_initialized() {
        println!("{} Sift is already initialized.", "Note:".yellow().bold());
        println!("  Config: {}", paths.config_file.display());
        println!("  Database: {}", paths.database_file.display());
        return Ok(());
    }

    println!("{}", "Initializing Sift...".cyan().bold());

    paths.ensure_dirs().context("Failed to create directories")?;
    println!("  {} Created directories", "✓".green());

    if !paths.config_file.exists() {
        Config::create_default_file(&paths.config_file)
            .context("Failed to create config file")?;
        println!(
            "  {} Created config: {}",
            "✓".green(),
            paths.config_file.display()
        );
    }

    let _db = Database::open(&paths.database_file).context("Failed to initialize database")?;
    println!(
        "  {} Created database: {}",
        "✓".green(),
        paths.database_file.display()
    );

    let root = shellexpand::tilde(&config.watch.root).to_string();
    std::fs::create_dir_all(&root).context("Failed to create watch folder")?;
    println!("  {} Watch folder: {}", "✓".green(), root);

    println!();
    println!("{}", "Sift initialized successfully!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Drop documents into: {}", root.cyan());
    println!("  2. Start watching: {}", "sift watch".cyan());
    println!("  3. Ask a question: {}", "sift ask \"...\"".cyan());

    Ok(())
}
