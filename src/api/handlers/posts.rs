/*
 * Responsibility
 * - /posts 系 CRUD handler
 * - Path の :id は公開 ID → extractor で復号化して内部 ID に変換して受け取る
 * - 画像付きの場合: validation → 画像保存 → store 呼び出し
 *   (store が失敗したら保存済み画像は破棄する)
 */
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    api::{
        dto::posts::{CreatePostRequest, MessageResponse, PostResponse, UpdatePostRequest},
        extractors::{PostForm, PublicPostId, UploadedFile},
    },
    error::AppError,
    repos::PostRow,
    state::AppState,
};

fn row_to_response(state: &AppState, row: PostRow) -> Result<PostResponse, AppError> {
    Ok(PostResponse {
        id: state.id_codec.encode(row.post_id)?,
        title: row.title,
        desc: row.description,
        username: row.username,
        photo_path: row.photo_path,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

async fn store_image(
    state: &AppState,
    image: Option<UploadedFile>,
) -> Result<Option<String>, AppError> {
    let Some(image) = image else {
        return Ok(None);
    };
    let path = state.images.store(&image.bytes, &image.file_name).await?;
    Ok(Some(path))
}

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub search: Option<String>,
}

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let rows = state.posts.search(query.search.as_deref()).await?;

    let mut res = Vec::with_capacity(rows.len());
    for row in rows {
        res.push(row_to_response(&state, row)?);
    }

    Ok(Json(res))
}

pub async fn create_post(
    State(state): State<AppState>,
    form: PostForm,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let req = CreatePostRequest::try_from(form.fields).map_err(AppError::validation)?;

    let photo_path = store_image(&state, form.image).await?;

    let row = match state
        .posts
        .create(req.into_new_post(photo_path.clone().unwrap_or_default()))
        .await
    {
        Ok(row) => row,
        Err(e) => {
            if let Some(path) = &photo_path {
                state.images.discard(path).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        post_id = row.post_id,
        has_image = photo_path.is_some(),
        "post created"
    );
    Ok((StatusCode::CREATED, Json(row_to_response(&state, row)?)))
}

pub async fn get_post(
    State(state): State<AppState>,
    post_id: PublicPostId,
) -> Result<Json<PostResponse>, AppError> {
    let row = state.posts.find_by_id(post_id.id).await?;

    Ok(Json(row_to_response(&state, row)?))
}

pub async fn update_post(
    State(state): State<AppState>,
    post_id: PublicPostId,
    form: PostForm,
) -> Result<Json<PostResponse>, AppError> {
    let req = UpdatePostRequest::try_from(form.fields).map_err(AppError::validation)?;

    let photo_path = store_image(&state, form.image).await?;

    let row = match state
        .posts
        .update_by_id(post_id.id, req.into_patch(photo_path.clone()))
        .await
    {
        Ok(row) => row,
        Err(e) => {
            if let Some(path) = &photo_path {
                state.images.discard(path).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!(post_id = row.post_id, "post updated");
    Ok(Json(row_to_response(&state, row)?))
}

pub async fn delete_post(
    State(state): State<AppState>,
    post_id: PublicPostId,
) -> Result<Json<MessageResponse>, AppError> {
    state.posts.delete_by_id(post_id.id).await?;

    tracing::info!(post_id = post_id.id, "post deleted");
    Ok(Json(MessageResponse {
        message: "Post deleted",
    }))
}
