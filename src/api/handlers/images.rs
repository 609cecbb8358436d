/*
 * Responsibility
 * - POST /api/upload: 単体の画像アップロード
 *   (body は確認メッセージの文字列のみ、保存先は Location header)
 * - GET /images: 保存済み画像の一覧 (公開パス)
 * - GET /images/{filename}: 画像の配信 (content-type / range は ServeFile に任せる)
 */
use axum::{
    Json,
    extract::{Path, Request, State},
    http::header,
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::{api::extractors::ImageUpload, error::AppError, state::AppState};

pub const UPLOAD_CONFIRMATION: &str = "File has been uploaded";

pub async fn upload_image(
    State(state): State<AppState>,
    ImageUpload(file): ImageUpload,
) -> Result<impl IntoResponse, AppError> {
    let path = state.images.store(&file.bytes, &file.file_name).await?;

    tracing::info!(path = %path, "image uploaded");
    Ok(([(header::LOCATION, path)], Json(UPLOAD_CONFIRMATION)))
}

pub async fn list_images(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.images.list().await?))
}

pub async fn get_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    req: Request,
) -> Result<Response, AppError> {
    let path = state.images.resolve(&filename).await?;

    let res = match ServeFile::new(path).oneshot(req).await {
        Ok(res) => res,
        Err(never) => match never {},
    };

    Ok(res.into_response())
}
