/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - RepoError / UploadError / IdCodecError を統一的に変換
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::RepoError;
use crate::services::{UploadError, id_codec::IdCodecError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("storage error")]
    Storage,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    /// Maps a body extractor rejection: 413 stays 413, anything else is a
    /// malformed request.
    pub fn from_rejection(status: StatusCode, message: impl Into<String>) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::validation(message)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Validation(message) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{resource} not found"),
            ),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "request body is too large".into(),
            ),
            AppError::Storage => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                "file could not be stored".into(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        (status, Json(ErrorResponse { code, message })).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Validation(message) => AppError::Validation(message),
            RepoError::NotFound => AppError::not_found("Post"),
            RepoError::Db(e) => {
                tracing::error!(error = ?e, "post store failure");
                AppError::Internal
            }
        }
    }
}

impl From<UploadError> for AppError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::NotFound => AppError::not_found("Image"),
            UploadError::NameExhausted(_) | UploadError::Io(_) => {
                tracing::error!(error = %e, "image storage failure");
                AppError::Storage
            }
        }
    }
}

// Decode failures are handled by the PublicId extractor; what reaches here
// is a server-side config or programming error.
impl From<IdCodecError> for AppError {
    fn from(e: IdCodecError) -> Self {
        tracing::error!(error = %e, "id codec failure");
        AppError::Internal
    }
}
