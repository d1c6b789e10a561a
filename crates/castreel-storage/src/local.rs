//! Local-filesystem storage backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::store::MediaStore;

/// Storage backend rooted at a local directory.
///
/// Keys are slash-separated relative paths resolved under the root. Used in
/// development and tests; the same keys work unchanged against `S3Store`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at the given directory. The directory is
    /// created if missing.
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a path under the root, rejecting traversal.
    fn resolve(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.starts_with('/') {
            return Err(StorageError::invalid_key(key));
        }
        if Path::new(key)
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(StorageError::invalid_key(key));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl MediaStore for LocalStore {
    async fn download_to(&self, key: &str, dest: &Path) -> StorageResult<()> {
        let src = self.resolve(key)?;
        debug!("Copying {} to {}", src.display(), dest.display());

        if !tokio::fs::try_exists(&src).await? {
            return Err(StorageError::not_found(key));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::copy(&src, dest)
            .await
            .map_err(|e| StorageError::download_failed(e.to_string()))?;
        Ok(())
    }

    async fn upload_file(&self, path: &Path, key: &str, _content_type: &str) -> StorageResult<()> {
        let dest = self.resolve(key)?;
        debug!("Copying {} to {}", path.display(), dest.display());

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::copy(path, &dest)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.resolve(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::delete_failed(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("media")).await.unwrap();

        let src = dir.path().join("reel.mp4");
        tokio::fs::write(&src, b"raw video bytes").await.unwrap();

        store
            .upload_file(&src, "uploads/u1/item/reel.mp4", "video/mp4")
            .await
            .unwrap();
        assert!(store.exists("uploads/u1/item/reel.mp4").await.unwrap());

        let dest = dir.path().join("work/input.mp4");
        store
            .download_to("uploads/u1/item/reel.mp4", &dest)
            .await
            .unwrap();
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"raw video bytes");
    }

    #[tokio::test]
    async fn test_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        let err = store
            .download_to("uploads/nope.mp4", &dir.path().join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));

        assert!(!store.exists("uploads/nope.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        store.delete("uploads/never-existed.mp4").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        let err = store.exists("../outside").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));

        let err = store.exists("/absolute").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
