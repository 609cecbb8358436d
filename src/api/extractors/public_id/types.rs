/**
 * Responsibility
 *  - リソースごとの「意味付きID型」を宣言する
 *  - Resource::NAME は NotFound メッセージに使う ("Post not found")
 */
use super::core::{PublicId, Resource};

// posts
pub enum PostTag {}

impl Resource for PostTag {
    const NAME: &'static str = "Post";
}

pub type PublicPostId = PublicId<PostTag>;
