/*
 * Responsibility
 * - Posts の request/response DTO
 * - 公開 ID を返す場合は、encode 済みの値を返す (内部 ID を漏らさない)
 * - validation (必須項目の有無) は upload より前に行う
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::repos::{NewPost, PostPatch};

/// Raw post fields as sent by the client (JSON body or multipart text parts).
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostFields {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug)]
pub struct CreatePostRequest {
    pub title: String,
    pub desc: String,
    pub username: String,
}

impl TryFrom<PostFields> for CreatePostRequest {
    type Error = &'static str;

    fn try_from(fields: PostFields) -> Result<Self, Self::Error> {
        let title = fields.title.unwrap_or_default();
        let username = fields.username.unwrap_or_default();

        if title.trim().is_empty() {
            return Err("title is required");
        }
        if username.trim().is_empty() {
            return Err("username is required");
        }

        Ok(Self {
            title,
            desc: fields.desc.unwrap_or_default(),
            username,
        })
    }
}

impl CreatePostRequest {
    pub fn into_new_post(self, photo_path: String) -> NewPost {
        NewPost {
            title: self.title,
            description: self.desc,
            username: self.username,
            photo_path,
        }
    }
}

#[derive(Debug)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub username: Option<String>,
}

impl TryFrom<PostFields> for UpdatePostRequest {
    type Error = &'static str;

    fn try_from(fields: PostFields) -> Result<Self, Self::Error> {
        if let Some(title) = &fields.title
            && title.trim().is_empty()
        {
            return Err("title cannot be empty");
        }
        if let Some(username) = &fields.username
            && username.trim().is_empty()
        {
            return Err("username cannot be empty");
        }

        Ok(Self {
            title: fields.title,
            desc: fields.desc,
            username: fields.username,
        })
    }
}

impl UpdatePostRequest {
    pub fn into_patch(self, photo_path: Option<String>) -> PostPatch {
        PostPatch {
            title: self.title,
            description: self.desc,
            username: self.username,
            photo_path,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String, // encoded
    pub title: String,
    pub desc: String,
    pub username: String,
    pub photo_path: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
