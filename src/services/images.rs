//! Upload handler for post images.
//!
//! Files land in a single directory under generated names of the form
//! `<unix-millis><.ext>` and are referenced by clients as `/images/<name>`.
//!
//! Files are opened with `create_new`, so an existing image is never
//! overwritten. When two uploads hit the same millisecond the later one bumps
//! its timestamp and retries.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// URL prefix under which stored images are served.
pub const PUBLIC_PREFIX: &str = "/images";

const MAX_NAME_ATTEMPTS: usize = 64;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("image not found")]
    NotFound,
    #[error("no free file name after {0} attempts")]
    NameExhausted(usize),
    #[error("image storage io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// Opens the image directory, creating it when missing.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `bytes` under a fresh name and returns its public path
    /// (`/images/<name>`). The original file's extension is kept.
    pub async fn store(&self, bytes: &[u8], original_name: &str) -> Result<String, UploadError> {
        let ext = extension_of(original_name);
        let mut stamp = Utc::now().timestamp_millis();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = format!("{stamp}{ext}");
            let path = self.dir.join(&name);

            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    stamp += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if let Err(e) = write_durably(&mut file, bytes).await {
                drop(file);
                if let Err(rm) = fs::remove_file(&path).await {
                    tracing::warn!(path = %path.display(), error = %rm, "failed to remove partial upload");
                }
                return Err(e.into());
            }

            tracing::debug!(name = %name, size = bytes.len(), "image stored");
            return Ok(format!("{PUBLIC_PREFIX}/{name}"));
        }

        Err(UploadError::NameExhausted(MAX_NAME_ATTEMPTS))
    }

    /// Public paths of every stored image, sorted by name.
    pub async fn list(&self) -> Result<Vec<String>, UploadError> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names
            .into_iter()
            .map(|name| format!("{PUBLIC_PREFIX}/{name}"))
            .collect())
    }

    /// Filesystem path of an existing image. Anything other than a plain
    /// file name (separators, `..`) is reported as not found.
    pub async fn resolve(&self, name: &str) -> Result<PathBuf, UploadError> {
        if !is_plain_file_name(name) {
            return Err(UploadError::NotFound);
        }

        let path = self.dir.join(name);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(UploadError::NotFound),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(UploadError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort removal of a previously stored image, by public path.
    pub async fn discard(&self, public_path: &str) {
        let Some(name) = public_path
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| is_plain_file_name(name))
        else {
            return;
        };

        if let Err(e) = fs::remove_file(self.dir.join(name)).await {
            tracing::warn!(path = %public_path, error = %e, "failed to discard image");
        }
    }
}

async fn write_durably(file: &mut fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}

// ".png" for "cat.png"; "" when there is no usable extension.
fn extension_of(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_in(dir: &tempfile::TempDir) -> ImageStore {
        ImageStore::open(dir.path()).await.unwrap()
    }

    #[test]
    fn extension_is_kept_only_when_alphanumeric() {
        assert_eq!(extension_of("cat.png"), ".png");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of("weird.p$g"), "");
        assert_eq!(extension_of(".bashrc"), "");
    }

    #[test]
    fn plain_file_names_only() {
        assert!(is_plain_file_name("1700000000000.png"));
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name("../secret"));
        assert!(!is_plain_file_name("a/b.png"));
        assert!(!is_plain_file_name("/etc/passwd"));
    }

    #[tokio::test]
    async fn store_writes_bytes_under_generated_name() {
        let dir = tempfile::tempdir().unwrap();
        let images = store_in(&dir).await;

        let path = images.store(b"png-bytes", "holiday.png").await.unwrap();

        let name = path.strip_prefix("/images/").unwrap();
        let stem = name.strip_suffix(".png").unwrap();
        assert!(stem.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(
            std::fs::read(dir.path().join(name)).unwrap(),
            b"png-bytes"
        );
    }

    #[tokio::test]
    async fn concurrent_uploads_never_share_a_name() {
        let dir = tempfile::tempdir().unwrap();
        let images = store_in(&dir).await;

        let (a, b) = tokio::join!(
            images.store(b"first", "a.jpg"),
            images.store(b"second", "b.jpg")
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a, b);
        assert_eq!(images.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn list_returns_sorted_public_paths_of_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let images = store_in(&dir).await;
        std::fs::write(dir.path().join("2.png"), b"x").unwrap();
        std::fs::write(dir.path().join("1.png"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        assert_eq!(
            images.list().await.unwrap(),
            vec!["/images/1.png", "/images/2.png"]
        );
    }

    #[tokio::test]
    async fn list_fails_when_directory_is_gone() {
        let dir = tempfile::tempdir().unwrap();
        let images = store_in(&dir).await;
        std::fs::remove_dir(dir.path()).unwrap();

        assert!(matches!(images.list().await, Err(UploadError::Io(_))));
    }

    #[tokio::test]
    async fn resolve_reports_missing_and_traversal_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let images = store_in(&dir).await;
        std::fs::write(dir.path().join("1.png"), b"x").unwrap();

        assert_eq!(
            images.resolve("1.png").await.unwrap(),
            dir.path().join("1.png")
        );
        assert!(matches!(
            images.resolve("2.png").await,
            Err(UploadError::NotFound)
        ));
        assert!(matches!(
            images.resolve("../1.png").await,
            Err(UploadError::NotFound)
        ));
    }

    #[tokio::test]
    async fn discard_removes_stored_image() {
        let dir = tempfile::tempdir().unwrap();
        let images = store_in(&dir).await;
        let path = images.store(b"x", "a.gif").await.unwrap();

        images.discard(&path).await;

        assert!(images.list().await.unwrap().is_empty());
    }
}
