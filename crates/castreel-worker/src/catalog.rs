//! Media catalog seam.
//!
//! The catalog that owns media records (users, profiles, billing) lives in
//! the surrounding product; workers only resolve a record by id to learn
//! its storage key. `InMemoryCatalog` backs tests and the batch runner.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use thiserror::Error;

use castreel_models::{MediaItemId, MediaRecord};

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Media item not found: {0}")]
    NotFound(MediaItemId),

    #[error("Catalog backend error: {0}")]
    Backend(String),
}

impl CatalogError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Lookup of media records by id.
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// Resolve a media record, or `NotFound` for a missing id.
    async fn find(&self, id: &MediaItemId) -> CatalogResult<MediaRecord>;
}

/// Catalog held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    records: RwLock<HashMap<MediaItemId, MediaRecord>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a list of records.
    pub fn from_records(records: impl IntoIterator<Item = MediaRecord>) -> Self {
        let catalog = Self::new();
        for record in records {
            catalog.insert(record);
        }
        catalog
    }

    /// Insert or replace a record.
    pub fn insert(&self, record: MediaRecord) {
        self.write().insert(record.id.clone(), record);
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<MediaItemId, MediaRecord>> {
        match self.records.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<MediaItemId, MediaRecord>> {
        match self.records.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl MediaCatalog for InMemoryCatalog {
    async fn find(&self, id: &MediaItemId) -> CatalogResult<MediaRecord> {
        self.read()
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }
}

/// Load a JSON manifest of media records.
pub async fn load_manifest(path: impl AsRef<Path>) -> CatalogResult<Vec<MediaRecord>> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CatalogError::backend(format!("failed to read {}: {}", path.display(), e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| CatalogError::backend(format!("failed to parse {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(MediaRecord::new(
            MediaItemId::from("item-1"),
            "uploads/u1/item-1/reel.mp4",
            "reel.mp4",
        ));

        let record = catalog.find(&MediaItemId::from("item-1")).await.unwrap();
        assert_eq!(record.storage_key, "uploads/u1/item-1/reel.mp4");

        let err = catalog.find(&MediaItemId::from("missing")).await.unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_load_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let records = vec![
            MediaRecord::new(MediaItemId::from("a"), "uploads/a/raw.mp4", "raw.mp4"),
            MediaRecord::new(MediaItemId::from("b"), "uploads/b/raw.mov", "raw.mov"),
        ];
        tokio::fs::write(&path, serde_json::to_vec(&records).unwrap())
            .await
            .unwrap();

        let loaded = load_manifest(&path).await.unwrap();
        assert_eq!(loaded.len(), 2);

        let catalog = InMemoryCatalog::from_records(loaded);
        assert_eq!(catalog.len(), 2);
    }

    #[tokio::test]
    async fn test_load_manifest_missing_file() {
        let err = load_manifest("/nonexistent/manifest.json").await.unwrap_err();
        assert!(matches!(err, CatalogError::Backend(_)));
    }
}
