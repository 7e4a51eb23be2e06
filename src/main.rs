//! # Knowledge Base CLI (`kb`)
//!
//! ## Usage
//!
//! ```bash
//! kb --config ./config/kb.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kb init` | Create the SQLite database and run schema migrations |
//! | `kb serve` | Start the HTTP API server |
//! | `kb tag "<text>"` | Tag a piece of text without storing it |
//! | `kb list` | List stored snippets, newest first |
//! | `kb get <id>` | Show one snippet |
//! | `kb stats` | Snippet counts per tag |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use knowledge_base::{commands, config, server};

/// Knowledge Base CLI: short snippets auto-tagged as Technical, Urgent or
/// General.
#[derive(Parser)]
#[command(
    name = "kb",
    about = "Knowledge Base: auto-tagged knowledge snippets over a small REST API",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/kb.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Start the HTTP API server on `[server].bind`.
    Serve,

    /// Tag a piece of text and show which layer decided.
    ///
    /// Works without a config file; the remote classifier is then disabled
    /// and only keyword matching runs.
    Tag {
        /// Text to classify.
        text: String,
    },

    /// List stored snippets, newest first.
    List {
        /// Only show snippets with this tag (Technical, Urgent, General).
        #[arg(long)]
        tag: Option<String>,

        /// Case-insensitive substring filter on content.
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one snippet by id.
    Get {
        /// Snippet id.
        id: i64,
    },

    /// Show snippet counts per tag.
    Stats,
}

fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve => init_logging("info,sqlx=warn"),
        _ => init_logging("warn"),
    }

    match cli.command {
        // `tag` is useful before any config exists
        Commands::Tag { text } => {
            let cfg = config::load_config(&cli.config).unwrap_or_else(|_| config::Config::minimal());
            commands::run_tag(&cfg, &text).await?;
        }
        command => {
            let cfg = config::load_config(&cli.config)?;
            match command {
                Commands::Init => commands::run_init(&cfg).await?,
                Commands::Serve => server::run_server(&cfg).await?,
                Commands::List { tag, search } => commands::run_list(&cfg, tag, search).await?,
                Commands::Get { id } => commands::run_get(&cfg, id).await?,
                Commands::Stats => commands::run_stats(&cfg).await?,
                Commands::Tag { .. } => {}
            }
        }
    }

    Ok(())
}
