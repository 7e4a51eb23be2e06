//! SQLite-backed [`SnippetStore`] implementation.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::DateTime;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{now_millis, SnippetFilter, SnippetStore};
use crate::models::{Snippet, Tag};

/// SQLite implementation of the [`SnippetStore`] trait.
///
/// Expects the schema created by [`crate::migrate::run_migrations`].
/// `created_at` is stored as Unix milliseconds.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn snippet_from_row(row: &SqliteRow) -> Result<Snippet> {
    let tag: String = row.try_get("tag")?;
    let created_ms: i64 = row.try_get("created_at")?;
    let created_at = DateTime::from_timestamp_millis(created_ms)
        .ok_or_else(|| anyhow!("invalid created_at timestamp: {}", created_ms))?;

    Ok(Snippet {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        tag: tag.parse()?,
        created_at,
    })
}

#[async_trait]
impl SnippetStore for SqliteStore {
    async fn insert(&self, content: &str, tag: Tag) -> Result<Snippet> {
        let created_at = now_millis();
        let result = sqlx::query("INSERT INTO snippets (content, tag, created_at) VALUES (?, ?, ?)")
            .bind(content)
            .bind(tag.as_str())
            .bind(created_at.timestamp_millis())
            .execute(&self.pool)
            .await?;

        Ok(Snippet {
            id: result.last_insert_rowid(),
            content: content.to_string(),
            tag,
            created_at,
        })
    }

    async fn get(&self, id: i64) -> Result<Option<Snippet>> {
        let row = sqlx::query("SELECT id, content, tag, created_at FROM snippets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(snippet_from_row).transpose()
    }

    async fn update(&self, id: i64, content: &str, tag: Tag) -> Result<Option<Snippet>> {
        let result = sqlx::query("UPDATE snippets SET content = ?, tag = ? WHERE id = ?")
            .bind(content)
            .bind(tag.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM snippets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, filter: &SnippetFilter) -> Result<Vec<Snippet>> {
        let rows = sqlx::query(
            r#"
            SELECT id, content, tag, created_at
            FROM snippets
            WHERE (?1 IS NULL OR tag = ?1)
              AND (?2 IS NULL OR instr(lower(content), lower(?2)) > 0)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(filter.tag.map(|t| t.as_str()))
        .bind(filter.search.as_deref())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(snippet_from_row).collect()
    }

    async fn count_by_tag(&self) -> Result<Vec<(Tag, i64)>> {
        let rows = sqlx::query("SELECT tag, COUNT(*) AS n FROM snippets GROUP BY tag")
            .fetch_all(&self.pool)
            .await?;

        let mut counts: Vec<(Tag, i64)> = Tag::ALL.iter().map(|t| (*t, 0)).collect();
        for row in &rows {
            let tag: Tag = row.try_get::<String, _>("tag")?.parse()?;
            let n: i64 = row.try_get("n")?;
            if let Some(entry) = counts.iter_mut().find(|(t, _)| *t == tag) {
                entry.1 = n;
            }
        }
        Ok(counts)
    }
}
