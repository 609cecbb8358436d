/*
 * Responsibility
 * - POST/PUT /posts の body を PostForm に変換する
 *   - multipart/form-data: text (title/desc/username) + file (image)
 *   - application/x-www-form-urlencoded: title=..&desc=..&username=..
 *   - application/json: {"title","desc","username"}
 * - POST /api/upload の file part を取り出す (ImageUpload)
 * - 形式エラー / 未知・重複フィールドは AppError::Validation (400)
 * - body 上限超過は AppError::PayloadTooLarge (413)
 */
use axum::{
    Form, Json,
    body::Bytes,
    extract::{FromRequest, Multipart, Request, multipart::Field, multipart::MultipartError},
    http::{HeaderMap, header},
};

use crate::{api::dto::posts::PostFields, error::AppError};

#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Debug)]
pub struct PostForm {
    pub fields: PostFields,
    pub image: Option<UploadedFile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Multipart,
    UrlEncoded,
    Json,
}

impl<S> FromRequest<S> for PostForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match body_kind(req.headers()) {
            BodyKind::Json => {
                let Json(fields) = Json::<PostFields>::from_request(req, state)
                    .await
                    .map_err(|e| AppError::from_rejection(e.status(), e.body_text()))?;
                Ok(Self {
                    fields,
                    image: None,
                })
            }
            BodyKind::UrlEncoded => {
                let Form(fields) = Form::<PostFields>::from_request(req, state)
                    .await
                    .map_err(|e| AppError::from_rejection(e.status(), e.body_text()))?;
                Ok(Self {
                    fields,
                    image: None,
                })
            }
            BodyKind::Multipart => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| AppError::from_rejection(e.status(), e.body_text()))?;
                read_post_parts(multipart).await
            }
        }
    }
}

async fn read_post_parts(mut multipart: Multipart) -> Result<PostForm, AppError> {
    let mut fields = PostFields::default();
    let mut image = None;
    let mut seen_image = false;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => set_once(&mut fields.title, "title", read_text(field).await?)?,
            "desc" => set_once(&mut fields.desc, "desc", read_text(field).await?)?,
            "username" => set_once(&mut fields.username, "username", read_text(field).await?)?,
            "image" => {
                if seen_image {
                    return Err(duplicate_field("image"));
                }
                seen_image = true;
                image = read_file(field).await?;
            }
            other => {
                return Err(AppError::validation(format!("unknown field `{other}`")));
            }
        }
    }

    Ok(PostForm { fields, image })
}

/// The `file` part of a standalone upload. Other parts are ignored.
#[derive(Debug)]
pub struct ImageUpload(pub UploadedFile);

impl<S> FromRequest<S> for ImageUpload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::from_rejection(e.status(), e.body_text()))?;

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if field.name() != Some("file") {
                continue;
            }
            if let Some(file) = read_file(field).await? {
                return Ok(Self(file));
            }
        }

        Err(AppError::validation("file is required"))
    }
}

fn set_once(slot: &mut Option<String>, name: &str, value: String) -> Result<(), AppError> {
    if slot.is_some() {
        return Err(duplicate_field(name));
    }
    *slot = Some(value);
    Ok(())
}

fn duplicate_field(name: &str) -> AppError {
    AppError::validation(format!("duplicate field `{name}`"))
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field.text().await.map_err(multipart_error)
}

// Browsers send an empty, unnamed part when no file was picked.
async fn read_file(field: Field<'_>) -> Result<Option<UploadedFile>, AppError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let bytes = field.bytes().await.map_err(multipart_error)?;

    if file_name.is_empty() && bytes.is_empty() {
        return Ok(None);
    }

    Ok(Some(UploadedFile { file_name, bytes }))
}

// Anything that is neither multipart nor url-encoded goes to Json, whose
// rejection names the expected content type.
fn body_kind(headers: &HeaderMap) -> BodyKind {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.trim_start().to_ascii_lowercase())
        .unwrap_or_default();

    if content_type.starts_with("multipart/form-data") {
        BodyKind::Multipart
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        BodyKind::UrlEncoded
    } else {
        BodyKind::Json
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::from_rejection(e.status(), e.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_content_type(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn picks_body_kind_from_content_type() {
        assert_eq!(body_kind(&HeaderMap::new()), BodyKind::Json);
        assert_eq!(
            body_kind(&with_content_type("multipart/form-data; boundary=X")),
            BodyKind::Multipart
        );
        assert_eq!(
            body_kind(&with_content_type("application/x-www-form-urlencoded")),
            BodyKind::UrlEncoded
        );
        assert_eq!(
            body_kind(&with_content_type("Application/JSON")),
            BodyKind::Json
        );
    }

    #[test]
    fn set_once_rejects_second_value() {
        let mut slot = None;
        set_once(&mut slot, "title", "a".to_string()).unwrap();

        let err = set_once(&mut slot, "title", "b".to_string()).unwrap_err();

        assert!(matches!(err, AppError::Validation(m) if m == "duplicate field `title`"));
        assert_eq!(slot.as_deref(), Some("a"));
    }
}
