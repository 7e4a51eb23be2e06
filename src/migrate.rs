use anyhow::Result;
use sqlx::SqlitePool;

/// Create the `snippets` table and its indexes. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS snippets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL,
            tag TEXT NOT NULL DEFAULT 'General'
                CHECK (tag IN ('Technical', 'Urgent', 'General')),
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_snippets_created_at ON snippets(created_at DESC)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_snippets_tag ON snippets(tag)")
        .execute(pool)
        .await?;

    Ok(())
}
