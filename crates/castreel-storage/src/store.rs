//! The storage backend trait.

use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageResult;

/// Uniform read/write access to media objects, keyed by a path string.
///
/// Implementations must behave identically whether the backing store is a
/// local directory or a remote bucket; callers never branch on the backend.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Download an object to a local file, creating parent directories as
    /// needed.
    async fn download_to(&self, key: &str, dest: &Path) -> StorageResult<()>;

    /// Upload a local file under the given key.
    async fn upload_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()>;

    /// Check whether an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;
}
