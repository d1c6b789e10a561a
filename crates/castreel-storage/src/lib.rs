//! Object storage backends for raw and processed media.
//!
//! This crate provides:
//! - The `MediaStore` trait: uniform read/write keyed by a path string
//! - `LocalStore`: rooted local-filesystem backend
//! - `S3Store`: S3-compatible bucket backend (R2, MinIO, AWS)

pub mod error;
pub mod local;
pub mod s3;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use local::LocalStore;
pub use s3::{S3Config, S3Store};
pub use store::MediaStore;
