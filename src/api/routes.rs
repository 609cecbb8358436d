/*
 * Responsibility
 * - URL 構造を定義
 * - /health, /posts, /api/upload, /images をまとめる
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::handlers::{
    health::health,
    images::{get_image, list_images, upload_image},
    posts::{create_post, delete_post, get_post, list_posts, update_post},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/api/upload", post(upload_image))
        .route("/images", get(list_images))
        // also the static base for photoPath values
        .route("/images/{filename}", get(get_image))
}
