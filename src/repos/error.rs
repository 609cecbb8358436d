/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0}")]
    Validation(String),
    #[error("not found")]
    NotFound,
    #[error("db error")]
    Db(#[from] sqlx::Error),
}

impl RepoError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
