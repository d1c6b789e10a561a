//! The media processor trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::MediaResult;

/// A processing routine that turns a raw local file into a processed one.
///
/// Implementations may be slow and are given no cancellation signal; the
/// worker bounds each call with a timeout and abandons it on expiry, so a
/// call may keep running after its task has been failed.
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    /// Process the file at `input` and return the path of the output.
    async fn process(&self, input: &Path) -> MediaResult<PathBuf>;
}
