/*
 * Responsibility
 * - Path の String を公開 ID 型として受け、復号して内部 ID (i64) へ変換する
 * - 復号できない ID は「存在しない ID」と同じ扱い (404 "<Resource> not found")
 *
 * 置くもの
 *  - PublicId<T> の定義（ジェネリック本体）
 *  - impl FromRequestParts<AppState> for PublicId<T>
 * 置かないもの
 *  - Post などの具体リソース名 (types.rs)
 */
use std::marker::PhantomData;

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::{error::AppError, state::AppState};

/// A resource addressed by public id.
pub trait Resource {
    const NAME: &'static str;
}

pub struct PublicId<T> {
    pub id: i64,
    _marker: PhantomData<T>,
}

impl<T> PublicId<T> {
    fn new(id: i64) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }
}

impl<T> FromRequestParts<AppState> for PublicId<T>
where
    T: Resource + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(public_id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::not_found(T::NAME))?;

        let id = state.id_codec.decode(&public_id).map_err(|e| {
            tracing::debug!(public_id = %public_id, error = %e, "undecodable public id");
            AppError::not_found(T::NAME)
        })?;

        Ok(Self::new(id))
    }
}

impl<T> std::fmt::Debug for PublicId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicId").field("id", &self.id).finish()
    }
}
