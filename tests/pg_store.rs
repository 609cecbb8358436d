//! PgPostStore against a real PostgreSQL.
//!
//! Runs only when `TEST_DATABASE_URL` is set; otherwise every test returns
//! early. Rows are tagged with a per-run marker so an existing `posts`
//! table is fine.

use posts_api::repos::{NewPost, PgPostStore, PostPatch, PostStore, RepoError};
use sqlx::postgres::PgPoolOptions;

async fn store() -> Option<PgPostStore> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("skipping PgPostStore test (set TEST_DATABASE_URL)");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("Failed to connect to TEST_DATABASE_URL");
    let store = PgPostStore::new(pool);
    store.ensure_schema().await.expect("Failed to create schema");
    Some(store)
}

fn marker() -> String {
    format!(
        "run{}",
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

fn new_post(title: String) -> NewPost {
    NewPost {
        title,
        description: "d".into(),
        username: "alice".into(),
        photo_path: String::new(),
    }
}

#[tokio::test]
async fn crud_round_trip_with_merge_update() {
    let Some(store) = store().await else { return };
    let title = format!("{} hello", marker());

    let created = store.create(new_post(title.clone())).await.unwrap();
    assert_eq!(created.title, title);
    assert_eq!(created.photo_path, "");

    let fetched = store.find_by_id(created.post_id).await.unwrap();
    assert_eq!(fetched.post_id, created.post_id);
    assert_eq!(fetched.created_at, created.created_at);

    let updated = store
        .update_by_id(
            created.post_id,
            PostPatch {
                description: Some("x".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.description, "x");
    assert_eq!(updated.title, title);
    assert_eq!(updated.username, "alice");
    assert_eq!(updated.created_at, created.created_at);

    assert!(
        store
            .find_all()
            .await
            .unwrap()
            .iter()
            .any(|row| row.post_id == created.post_id)
    );

    store.delete_by_id(created.post_id).await.unwrap();
    assert!(matches!(
        store.find_by_id(created.post_id).await,
        Err(RepoError::NotFound)
    ));
    assert!(matches!(
        store.delete_by_id(created.post_id).await,
        Err(RepoError::NotFound)
    ));
    assert!(matches!(
        store
            .update_by_id(created.post_id, PostPatch::default())
            .await,
        Err(RepoError::NotFound)
    ));
}

#[tokio::test]
async fn search_is_case_insensitive_and_literal() {
    let Some(store) = store().await else { return };
    let tag = marker();

    let upper = store
        .create(new_post(format!("{} 50% OFF", tag.to_uppercase())))
        .await
        .unwrap();
    let other = store
        .create(new_post(format!("{tag} 500 items")))
        .await
        .unwrap();

    let hits = store.search(Some(&format!("{tag} 50% off"))).await.unwrap();
    let ids: Vec<i64> = hits.iter().map(|row| row.post_id).collect();
    assert_eq!(ids, vec![upper.post_id]);

    let hits = store.search(Some(&tag)).await.unwrap();
    let ids: Vec<i64> = hits.iter().map(|row| row.post_id).collect();
    assert_eq!(ids, vec![upper.post_id, other.post_id]);

    store.delete_by_id(upper.post_id).await.unwrap();
    store.delete_by_id(other.post_id).await.unwrap();
}
