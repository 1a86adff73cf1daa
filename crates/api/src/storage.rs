//! Product image storage.
//!
//! Images are written to a local directory that the server exposes under
//! `/uploads`, and referenced by absolute URL so both clients can load them
//! directly.

use std::path::PathBuf;

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while storing or removing images.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Content type is not an accepted image format.
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    /// The URL does not point into this store.
    #[error("not a stored image: {0}")]
    ForeignUrl(String),

    /// Filesystem error.
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

/// An uploaded image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub content_type: String,
    pub data: Bytes,
}

/// Where product images live.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store an image and return its public URL.
    async fn save(&self, upload: ImageUpload) -> Result<String, StorageError>;

    /// Remove a previously stored image. Missing files are not an error.
    async fn remove(&self, url: &str) -> Result<(), StorageError>;
}

/// Remove images, logging failures instead of returning them.
pub async fn remove_best_effort(store: &dyn ImageStore, urls: &[String]) {
    for url in urls {
        if let Err(e) = store.remove(url).await {
            tracing::warn!(error = %e, url = %url, "Failed to remove product image");
        }
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

/// Image store on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    dir: PathBuf,
    base_url: String,
}

impl LocalImageStore {
    /// Create a store writing into `dir`, served at `base_url`.
    #[must_use]
    pub fn new(dir: PathBuf, base_url: String) -> Self {
        Self {
            dir,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn file_name_of<'a>(&self, url: &'a str) -> Result<&'a str, StorageError> {
        url.strip_prefix(&self.base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| {
                !name.is_empty() && !name.contains('/') && !name.contains('\\') && !name.contains("..")
            })
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, upload: ImageUpload) -> Result<String, StorageError> {
        let extension = extension_for(&upload.content_type)
            .ok_or_else(|| StorageError::UnsupportedType(upload.content_type.clone()))?;
        let name = format!("{}.{extension}", Uuid::new_v4());

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&name), &upload.data).await?;

        tracing::debug!(file = %name, bytes = upload.data.len(), "Stored product image");
        Ok(format!("{}/{name}", self.base_url))
    }

    async fn remove(&self, url: &str) -> Result<(), StorageError> {
        let name = self.file_name_of(url)?;
        match tokio::fs::remove_file(self.dir.join(name)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store(dir: &std::path::Path) -> LocalImageStore {
        LocalImageStore::new(dir.to_path_buf(), "http://cdn.test/uploads/".to_string())
    }

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("bazaar-storage-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_save_then_remove() {
        let dir = scratch_dir();
        let store = store(&dir);

        let url = store
            .save(ImageUpload {
                content_type: "image/png".into(),
                data: Bytes::from_static(b"\x89PNG"),
            })
            .await
            .unwrap();
        assert!(url.starts_with("http://cdn.test/uploads/"));
        assert!(url.ends_with(".png"));

        let name = url.rsplit('/').next().unwrap();
        assert!(dir.join(name).exists());

        store.remove(&url).await.unwrap();
        assert!(!dir.join(name).exists());

        // Removing twice is fine
        store.remove(&url).await.unwrap();

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_non_images() {
        let store = store(&scratch_dir());
        let result = store
            .save(ImageUpload {
                content_type: "application/pdf".into(),
                data: Bytes::from_static(b"%PDF"),
            })
            .await;
        assert!(matches!(result, Err(StorageError::UnsupportedType(_))));
    }

    #[tokio::test]
    async fn test_remove_refuses_foreign_or_escaping_urls() {
        let store = store(&scratch_dir());
        for url in [
            "https://elsewhere.test/uploads/a.png",
            "http://cdn.test/uploads/../secrets.txt",
            "http://cdn.test/uploads/nested/a.png",
            "http://cdn.test/uploads/",
        ] {
            assert!(
                matches!(store.remove(url).await, Err(StorageError::ForeignUrl(_))),
                "{url}"
            );
        }
    }
}
