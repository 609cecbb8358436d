pub mod id_codec;
pub mod images;

pub use id_codec::IdCodec;
pub use images::{ImageStore, UploadError};
