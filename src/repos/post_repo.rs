/*
 * Responsibility
 * - posts の Store Adapter 定義 (PostStore trait)
 * - PostgreSQL 実装 (sqlx): create / find / update (merge) / delete / title 検索
 * - 必須項目チェックは backend 共通 (NewPost::validate / PostPatch::validate)
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::repos::error::RepoError;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PostRow {
    #[sqlx(rename = "postId")]
    pub post_id: i64,

    pub title: String,
    pub description: String,
    pub username: String,

    // "" when no image was attached
    #[sqlx(rename = "photoPath")]
    pub photo_path: String,

    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[sqlx(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    pub username: String,
    pub photo_path: String,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), RepoError> {
        if self.title.trim().is_empty() {
            return Err(RepoError::validation("title is required"));
        }
        if self.username.trim().is_empty() {
            return Err(RepoError::validation("username is required"));
        }
        Ok(())
    }
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub username: Option<String>,
    pub photo_path: Option<String>,
}

impl PostPatch {
    pub fn validate(&self) -> Result<(), RepoError> {
        if let Some(title) = &self.title
            && title.trim().is_empty()
        {
            return Err(RepoError::validation("title cannot be empty"));
        }
        if let Some(username) = &self.username
            && username.trim().is_empty()
        {
            return Err(RepoError::validation("username cannot be empty"));
        }
        Ok(())
    }
}

/// Persistence for posts.
///
/// Every id-addressed operation answers `RepoError::NotFound` when no record
/// matches. `search(None)` and `search(Some(""))` behave like `find_all`.
#[async_trait]
pub trait PostStore: Send + Sync + 'static {
    // Returns the backend name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn create(&self, post: NewPost) -> Result<PostRow, RepoError>;

    async fn find_all(&self) -> Result<Vec<PostRow>, RepoError>;

    async fn find_by_id(&self, post_id: i64) -> Result<PostRow, RepoError>;

    // Merges `patch` into the stored record and returns the merged record.
    async fn update_by_id(&self, post_id: i64, patch: PostPatch) -> Result<PostRow, RepoError>;

    async fn delete_by_id(&self, post_id: i64) -> Result<(), RepoError>;

    // Case-insensitive substring match on title.
    async fn search(&self, title: Option<&str>) -> Result<Vec<PostRow>, RepoError>;

    // Releases backend resources. Called once after the server has drained.
    async fn close(&self) {}
}

#[derive(Clone, Debug)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the posts table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                "postId" BIGSERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                username TEXT NOT NULL,
                "photoPath" TEXT NOT NULL DEFAULT '',
                "createdAt" TIMESTAMPTZ NOT NULL DEFAULT now(),
                "updatedAt" TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn create(&self, post: NewPost) -> Result<PostRow, RepoError> {
        post.validate()?;

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (title, description, username, "photoPath")
            VALUES ($1, $2, $3, $4)
            RETURNING
                "postId", title, description, username, "photoPath", "createdAt", "updatedAt"
            "#,
        )
        .bind(&post.title)
        .bind(&post.description)
        .bind(&post.username)
        .bind(&post.photo_path)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_all(&self) -> Result<Vec<PostRow>, RepoError> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT
                "postId", title, description, username, "photoPath", "createdAt", "updatedAt"
            FROM posts
            ORDER BY "postId" ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_by_id(&self, post_id: i64) -> Result<PostRow, RepoError> {
        sqlx::query_as::<_, PostRow>(
            r#"
            SELECT
                "postId", title, description, username, "photoPath", "createdAt", "updatedAt"
            FROM posts
            WHERE "postId" = $1
            "#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn update_by_id(&self, post_id: i64, patch: PostPatch) -> Result<PostRow, RepoError> {
        patch.validate()?;

        sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                username = COALESCE($4, username),
                "photoPath" = COALESCE($5, "photoPath"),
                "updatedAt" = now()
            WHERE "postId" = $1
            RETURNING
                "postId", title, description, username, "photoPath", "createdAt", "updatedAt"
            "#,
        )
        .bind(post_id)
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.username.as_deref())
        .bind(patch.photo_path.as_deref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn delete_by_id(&self, post_id: i64) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE "postId" = $1
            "#,
        )
        .bind(post_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }

    async fn search(&self, title: Option<&str>) -> Result<Vec<PostRow>, RepoError> {
        let Some(title) = title.filter(|t| !t.is_empty()) else {
            return self.find_all().await;
        };

        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT
                "postId", title, description, username, "photoPath", "createdAt", "updatedAt"
            FROM posts
            WHERE title ILIKE $1 ESCAPE '\'
            ORDER BY "postId" ASC
            "#,
        )
        .bind(contains_pattern(title))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

// The user's text is matched literally: LIKE wildcards are escaped.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_pattern_escapes_like_wildcards() {
        assert_eq!(contains_pattern("abc"), "%abc%");
        assert_eq!(contains_pattern("50%_off"), r"%50\%\_off%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }

    #[test]
    fn new_post_requires_title_and_username() {
        let post = NewPost {
            title: "  ".into(),
            username: "alice".into(),
            ..Default::default()
        };
        assert!(matches!(post.validate(), Err(RepoError::Validation(m)) if m == "title is required"));

        let post = NewPost {
            title: "Hello".into(),
            ..Default::default()
        };
        assert!(matches!(post.validate(), Err(RepoError::Validation(m)) if m == "username is required"));

        let post = NewPost {
            title: "Hello".into(),
            username: "alice".into(),
            ..Default::default()
        };
        assert!(post.validate().is_ok());
    }

    #[test]
    fn patch_allows_clearing_description_but_not_title() {
        let patch = PostPatch {
            description: Some(String::new()),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());

        let patch = PostPatch {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }
}
