//! Sift CLI - ask questions about the files in a watched folder.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Sift - a semantic index over a watched folder, with grounded answers
#[derive(Parser)]
#[command(name = "sift")]
#[command(version)]
#[command(about = "Semantic index over a watched folder, with grounded answers", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Sift (create config and database)
    Init,

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Reconcile the index with the watched folder once
    Index,

    /// Index the watched folder and keep it current until Ctrl+C
    Watch,

    /// Ask a question about your files
    Ask {
        /// Your question
        question: String,

        /// Number of chunks to retrieve (default: from config)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Sampling temperature (default: from config)
        #[arg(short, long)]
        temperature: Option<f32>,

        /// Maximum tokens to generate (default: from config)
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Only search files under this path (can be specified multiple times)
        #[arg(short, long = "path")]
        paths: Vec<String>,

        /// Conversation id echoed back with the answer
        #[arg(long)]
        conversation: Option<String>,

        /// Hide source references
        #[arg(long)]
        no_sources: bool,
    },

    /// Remove a file from the index
    Remove {
        /// Path of the file
        path: PathBuf,
    },

    /// Show indexed documents
    Status,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the config file location
    Path,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sift=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sift=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(),
            ConfigCommands::Path => commands::config::path(),
        },
        Commands::Index => commands::index::run(),
        Commands::Watch => commands::watch::run(),
        Commands::Ask {
            question,
            top_k,
            temperature,
            max_tokens,
            paths,
            conversation,
            no_sources,
        } => commands::ask::run(
            &question,
            commands::ask::AskOptions {
                top_k,
                temperature,
                max_tokens,
                paths,
                conversation,
                show_sources: !no_sources,
            },
        ),
        Commands::Remove { path } => commands::remove::run(&path),
        Commands::Status => commands::status::run(),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
