/*
 * Responsibility
 * - handler が受け取る入力型 (Path の公開 ID, post/upload の body)
 */
pub mod form;
pub mod public_id;

pub use form::{ImageUpload, PostForm, UploadedFile};
pub use public_id::PublicPostId;
