/*
 * Responsibility
 * - Post Store Adapter (trait) と backend 実装の公開
 * - postgres: DATABASE_URL がある場合 / memory: ない場合とテスト
 */
pub mod error;
pub mod memory;
pub mod post_repo;

pub use error::RepoError;
pub use memory::InMemoryPostStore;
pub use post_repo::{NewPost, PgPostStore, PostPatch, PostRow, PostStore};
