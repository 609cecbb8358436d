/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - posts: Store Adapter, id_codec: 公開 ID 変換, images: アップロード先
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::{
    repos::PostStore,
    services::{IdCodec, ImageStore},
};

#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostStore>,
    pub id_codec: IdCodec,
    pub images: ImageStore,
}

impl AppState {
    pub fn new(posts: Arc<dyn PostStore>, id_codec: IdCodec, images: ImageStore) -> Self {
        Self {
            posts,
            id_codec,
            images,
        }
    }
}
