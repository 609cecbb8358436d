//! HTTP test harness.
//!
//! Runs the real router (middleware included) over the in-memory post store
//! and a temporary image directory.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use posts_api::{
    app::build_router,
    config::Config,
    repos::InMemoryPostStore,
    services::{IdCodec, ImageStore},
    state::AppState,
};
use serde_json::Value;
use tempfile::TempDir;

pub struct TestApp {
    pub server: TestServer,
    pub posts: InMemoryPostStore,
    image_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let image_dir = tempfile::tempdir().expect("Failed to create image dir");
        let config = Config::for_testing(image_dir.path());

        let posts = InMemoryPostStore::new();
        let id_codec = IdCodec::new(config.sqids_min_length, &config.sqids_alphabet)
            .expect("Failed to build id codec");
        let images = ImageStore::open(image_dir.path())
            .await
            .expect("Failed to open image store");

        let state = AppState::new(Arc::new(posts.clone()), id_codec, images);
        let server =
            TestServer::new(build_router(state, &config)).expect("Failed to create test server");

        Self {
            server,
            posts,
            image_dir,
        }
    }

    pub fn image_dir(&self) -> &Path {
        self.image_dir.path()
    }

    /// Creates a post through the API and returns its JSON body.
    pub async fn seed_post(&self, title: &str, desc: &str, username: &str) -> Value {
        let res = self
            .server
            .post("/posts")
            .json(&serde_json::json!({
                "title": title,
                "desc": desc,
                "username": username,
            }))
            .await;
        assert_eq!(res.status_code(), 201, "seed failed: {}", res.text());
        res.json::<Value>()
    }

    pub fn stored_image_count(&self) -> usize {
        std::fs::read_dir(self.image_dir())
            .expect("image dir readable")
            .count()
    }
}

pub fn post_form(title: &str, desc: &str, username: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("title", title.to_string())
        .add_text("desc", desc.to_string())
        .add_text("username", username.to_string())
}

pub fn png_part(file_name: &str, bytes: &[u8]) -> Part {
    Part::bytes(bytes.to_vec())
        .file_name(file_name)
        .mime_type("image/png")
}
