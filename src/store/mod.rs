//! Storage abstraction for snippets.
//!
//! The [`SnippetStore`] trait covers every persistence operation the API
//! needs, with a SQLite backend for the server and an in-memory backend
//! for tests.
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`insert`](SnippetStore::insert) | Create a row with a generated id and timestamp |
//! | [`get`](SnippetStore::get) | Fetch by id |
//! | [`update`](SnippetStore::update) | Replace content and tag by id |
//! | [`delete`](SnippetStore::delete) | Remove by id |
//! | [`list`](SnippetStore::list) | Filtered listing, newest first |
//! | [`count_by_tag`](SnippetStore::count_by_tag) | Per-label row counts |

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Snippet, Tag};

/// Optional filters for [`SnippetStore::list`].
#[derive(Debug, Clone, Default)]
pub struct SnippetFilter {
    /// Exact label match.
    pub tag: Option<Tag>,
    /// Case-insensitive substring of `content`.
    pub search: Option<String>,
}

#[async_trait]
pub trait SnippetStore: Send + Sync {
    async fn insert(&self, content: &str, tag: Tag) -> Result<Snippet>;

    async fn get(&self, id: i64) -> Result<Option<Snippet>>;

    /// Returns the updated row, or `None` if `id` does not exist.
    async fn update(&self, id: i64, content: &str, tag: Tag) -> Result<Option<Snippet>>;

    /// Returns `false` if `id` did not exist.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Matching rows ordered by `created_at` descending, then `id` descending.
    async fn list(&self, filter: &SnippetFilter) -> Result<Vec<Snippet>>;

    /// Row count per label, one entry per label in [`Tag::ALL`] order.
    async fn count_by_tag(&self) -> Result<Vec<(Tag, i64)>>;
}

/// Current time truncated to milliseconds, the precision rows are stored at.
pub(crate) fn now_millis() -> DateTime<Utc> {
    let ms = Utc::now().timestamp_millis();
    DateTime::from_timestamp_millis(ms).unwrap_or_else(Utc::now)
}
