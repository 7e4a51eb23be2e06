//! CLI command implementations.
//!
//! Each `run_*` function backs one `kb` subcommand and prints its result to
//! stdout. They share the store and tagger used by the HTTP server, so the
//! CLI sees exactly what the API serves.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::db;
use crate::migrate::run_migrations;
use crate::models::Tag;
use crate::store::{SnippetFilter, SnippetStore, SqliteStore};
use crate::tagger::Tagger;

const PREVIEW_CHARS: usize = 80;

async fn open_store(config: &Config) -> Result<SqliteStore> {
    let pool = db::connect(config).await?;
    run_migrations(&pool).await?;
    Ok(SqliteStore::new(pool))
}

/// `kb init`: create the database and schema.
pub async fn run_init(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    store.pool().close().await;
    println!("Database initialized successfully.");
    Ok(())
}

/// `kb tag <text>`: run the tagger without storing anything.
pub async fn run_tag(config: &Config, text: &str) -> Result<()> {
    let tagger = Tagger::from_config(config)?;
    let decision = tagger.decide(text).await;
    println!("tag:    {}", decision.tag);
    println!("source: {}", decision.source);
    Ok(())
}

/// `kb list [--tag] [--search]`.
pub async fn run_list(config: &Config, tag: Option<String>, search: Option<String>) -> Result<()> {
    let tag = match tag.as_deref() {
        Some(raw) => Some(raw.parse::<Tag>()?),
        None => None,
    };
    let filter = SnippetFilter { tag, search };

    let store = open_store(config).await?;
    let snippets = store.list(&filter).await?;
    store.pool().close().await;

    if snippets.is_empty() {
        println!("No snippets found.");
        return Ok(());
    }

    for snippet in &snippets {
        println!(
            "#{:<5} [{:<9}] {}  {}",
            snippet.id,
            snippet.tag.as_str(),
            snippet.created_at.format("%Y-%m-%d %H:%M:%S"),
            snippet.preview(PREVIEW_CHARS).replace('\n', " ")
        );
    }
    println!();
    println!("{} snippet(s)", snippets.len());
    Ok(())
}

/// `kb get <id>`.
pub async fn run_get(config: &Config, id: i64) -> Result<()> {
    let store = open_store(config).await?;
    let snippet = store.get(id).await?;
    store.pool().close().await;

    let Some(snippet) = snippet else {
        bail!("No snippet found with id {}.", id);
    };

    println!("--- Snippet ---");
    println!("id:         {}", snippet.id);
    println!("ai_tag:     {}", snippet.tag);
    println!("created_at: {}", snippet.created_at.to_rfc3339());
    println!();
    println!("--- Content ---");
    println!("{}", snippet.content);
    Ok(())
}

/// `kb stats`: row counts per tag.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    let counts = store.count_by_tag().await?;
    store.pool().close().await;

    let total: i64 = counts.iter().map(|(_, n)| n).sum();
    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Knowledge Base Stats");
    println!("====================");
    println!();
    println!("  Database:  {}", config.db.path.display());
    println!("  Size:      {}", format_bytes(db_size));
    println!("  Snippets:  {}", total);
    println!();
    for (tag, n) in &counts {
        println!("  {:<10} {}", tag.as_str(), n);
    }
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
