//! Shared data models for the Castreel media pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Media items and their storage records
//! - Processing task state and queue status
//! - Transcode settings

pub mod encoding;
pub mod media_item;
pub mod task;

// Re-export common types
pub use encoding::TranscodeSettings;
pub use media_item::{MediaItemId, MediaRecord};
pub use task::{QueueStatus, TaskId, TaskState};
