//! In-memory [`SnippetStore`] implementation for tests.
//!
//! Rows live in a `Vec` behind `std::sync::RwLock`. Ids are assigned from a
//! counter and never reused, matching SQLite `AUTOINCREMENT`.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{now_millis, SnippetFilter, SnippetStore};
use crate::models::{Snippet, Tag};

#[derive(Default)]
struct Rows {
    snippets: Vec<Snippet>,
    last_id: i64,
}

#[derive(Default)]
pub struct InMemoryStore {
    rows: RwLock<Rows>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Rows>> {
        self.rows.read().map_err(|_| anyhow!("snippet store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Rows>> {
        self.rows.write().map_err(|_| anyhow!("snippet store lock poisoned"))
    }
}

fn matches(snippet: &Snippet, filter: &SnippetFilter) -> bool {
    if let Some(tag) = filter.tag {
        if snippet.tag != tag {
            return false;
        }
    }
    if let Some(search) = &filter.search {
        if !snippet.content.to_lowercase().contains(&search.to_lowercase()) {
            return false;
        }
    }
    true
}

#[async_trait]
impl SnippetStore for InMemoryStore {
    async fn insert(&self, content: &str, tag: Tag) -> Result<Snippet> {
        let mut rows = self.write()?;
        rows.last_id += 1;
        let snippet = Snippet {
            id: rows.last_id,
            content: content.to_string(),
            tag,
            created_at: now_millis(),
        };
        rows.snippets.push(snippet.clone());
        Ok(snippet)
    }

    async fn get(&self, id: i64) -> Result<Option<Snippet>> {
        let rows = self.read()?;
        Ok(rows.snippets.iter().find(|s| s.id == id).cloned())
    }

    async fn update(&self, id: i64, content: &str, tag: Tag) -> Result<Option<Snippet>> {
        let mut rows = self.write()?;
        Ok(rows.snippets.iter_mut().find(|s| s.id == id).map(|s| {
            s.content = content.to_string();
            s.tag = tag;
            s.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut rows = self.write()?;
        let before = rows.snippets.len();
        rows.snippets.retain(|s| s.id != id);
        Ok(rows.snippets.len() != before)
    }

    async fn list(&self, filter: &SnippetFilter) -> Result<Vec<Snippet>> {
        let rows = self.read()?;
        let mut found: Vec<Snippet> = rows
            .snippets
            .iter()
            .filter(|s| matches(s, filter))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }

    async fn count_by_tag(&self) -> Result<Vec<(Tag, i64)>> {
        let rows = self.read()?;
        Ok(Tag::ALL
            .iter()
            .map(|tag| {
                let n = rows.snippets.iter().filter(|s| s.tag == *tag).count() as i64;
                (*tag, n)
            })
            .collect())
    }
}
