//! In-memory `PostStore`.
//!
//! Used when `DATABASE_URL` is not configured, and by the test-suite.
//! Records live only as long as the process.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::repos::error::RepoError;
use crate::repos::post_repo::{NewPost, PostPatch, PostRow, PostStore};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    rows: BTreeMap<i64, PostRow>,
}

/// Cheap to clone; clones share the same records.
#[derive(Clone, Debug, Default)]
pub struct InMemoryPostStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, post: NewPost) -> Result<PostRow, RepoError> {
        post.validate()?;

        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let now = Utc::now();
        let row = PostRow {
            post_id: inner.next_id,
            title: post.title,
            description: post.description,
            username: post.username,
            photo_path: post.photo_path,
            created_at: now,
            updated_at: now,
        };
        inner.rows.insert(row.post_id, row.clone());

        Ok(row)
    }

    async fn find_all(&self) -> Result<Vec<PostRow>, RepoError> {
        Ok(self.inner.read().await.rows.values().cloned().collect())
    }

    async fn find_by_id(&self, post_id: i64) -> Result<PostRow, RepoError> {
        self.inner
            .read()
            .await
            .rows
            .get(&post_id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn update_by_id(&self, post_id: i64, patch: PostPatch) -> Result<PostRow, RepoError> {
        patch.validate()?;

        let mut inner = self.inner.write().await;
        let row = inner.rows.get_mut(&post_id).ok_or(RepoError::NotFound)?;

        if let Some(title) = patch.title {
            row.title = title;
        }
        if let Some(description) = patch.description {
            row.description = description;
        }
        if let Some(username) = patch.username {
            row.username = username;
        }
        if let Some(photo_path) = patch.photo_path {
            row.photo_path = photo_path;
        }
        row.updated_at = Utc::now();

        Ok(row.clone())
    }

    async fn delete_by_id(&self, post_id: i64) -> Result<(), RepoError> {
        self.inner
            .write()
            .await
            .rows
            .remove(&post_id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }

    async fn search(&self, title: Option<&str>) -> Result<Vec<PostRow>, RepoError> {
        let Some(title) = title.filter(|t| !t.is_empty()) else {
            return self.find_all().await;
        };
        let needle = title.to_lowercase();

        Ok(self
            .inner
            .read()
            .await
            .rows
            .values()
            .filter(|row| row.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}
