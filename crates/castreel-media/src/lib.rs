//! FFmpeg CLI wrapper for video processing.
//!
//! This crate provides:
//! - The `MediaProcessor` trait: the seam the worker invokes under timeout
//! - `FfmpegTranscoder`: normalizes uploads to delivery-ready MP4
//! - `FfmpegCommand`: argument builder for FFmpeg invocations

pub mod error;
pub mod processor;
pub mod transcode;

pub use error::{MediaError, MediaResult};
pub use processor::MediaProcessor;
pub use transcode::{FfmpegCommand, FfmpegTranscoder};
