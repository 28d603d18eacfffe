use crate::domain::repository::ImageStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Filesystem-backed image storage. Binaries land under
/// `<root>/uploads/recipe/<uuid>.<ext>`; the returned reference is the path
/// relative to the media root.
#[derive(Clone)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn save_image(&self, ext: &str, data: &[u8]) -> Result<String> {
        let relative = format!("uploads/recipe/{}.{}", Uuid::new_v4(), ext);
        let full = self.root.join(&relative);

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating media directory {}", parent.display()))?;
        }
        tokio::fs::write(&full, data)
            .await
            .with_context(|| format!("writing image {}", full.display()))?;

        debug!(path = %relative, "Image stored");
        Ok(relative)
    }

    #[instrument(skip(self))]
    async fn delete_image(&self, path: &str) -> Result<()> {
        let full = self.root.join(path);
        match tokio::fs::remove_file(&full).await {
            Ok(()) => {
                debug!(path = path, "Image deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = path, "Image already gone");
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("deleting image {}", full.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_image_returns_resolvable_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path());

        let path = store.save_image("jpg", b"fake image bytes").await.unwrap();

        assert!(path.starts_with("uploads/recipe/"));
        assert!(path.ends_with(".jpg"));
        let stored = tokio::fs::read(dir.path().join(&path)).await.unwrap();
        assert_eq!(stored, b"fake image bytes");
    }

    #[tokio::test]
    async fn test_save_image_unique_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path());

        let first = store.save_image("png", b"one").await.unwrap();
        let second = store.save_image("png", b"two").await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_delete_image_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path());

        let path = store.save_image("jpg", b"bytes").await.unwrap();
        store.delete_image(&path).await.unwrap();

        assert!(!dir.path().join(&path).exists());
    }

    #[tokio::test]
    async fn test_delete_missing_image_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path());

        let result = store.delete_image("uploads/recipe/nope.jpg").await;
        assert!(result.is_ok());
    }
}
