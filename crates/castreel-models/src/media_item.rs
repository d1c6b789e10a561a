//! Media item models.
//!
//! A media item is an externally owned record referencing a raw uploaded
//! file in object storage. The catalog that owns these rows lives outside
//! this workspace; workers only resolve records by id and read the storage
//! key off them.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a media item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct MediaItemId(pub String);

impl MediaItemId {
    /// Generate a new random media item ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MediaItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MediaItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MediaItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MediaItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A media record as resolved from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MediaRecord {
    /// Media item ID
    pub id: MediaItemId,

    /// Key of the raw file in object storage
    pub storage_key: String,

    /// Original filename as uploaded
    pub filename: String,

    /// MIME type of the raw file
    #[serde(default = "default_content_type")]
    pub content_type: String,

    /// Raw file size, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    /// Upload timestamp
    pub uploaded_at: DateTime<Utc>,
}

fn default_content_type() -> String {
    "video/mp4".to_string()
}

impl MediaRecord {
    /// Create a new record for a raw upload.
    pub fn new(
        id: MediaItemId,
        storage_key: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            id,
            storage_key: storage_key.into(),
            filename: filename.into(),
            content_type: default_content_type(),
            size_bytes: None,
            uploaded_at: Utc::now(),
        }
    }

    /// Set the MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Set the raw file size.
    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    /// File extension of the raw upload, without the dot.
    pub fn extension(&self) -> Option<&str> {
        std::path::Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_creation() {
        let record = MediaRecord::new(
            MediaItemId::from("item-1"),
            "uploads/user123/item-1/reel.mp4",
            "reel.mp4",
        );

        assert_eq!(record.id.as_str(), "item-1");
        assert_eq!(record.content_type, "video/mp4");
        assert_eq!(record.extension(), Some("mp4"));
    }

    #[test]
    fn test_record_builder() {
        let record = MediaRecord::new(MediaItemId::new(), "uploads/a/b.mov", "b.mov")
            .with_content_type("video/quicktime")
            .with_size(1024);

        assert_eq!(record.content_type, "video/quicktime");
        assert_eq!(record.size_bytes, Some(1024));
        assert_eq!(record.extension(), Some("mov"));
    }
}
