//! Video processing worker pool.
//!
//! This crate provides:
//! - The fixed-size worker pool draining the task queue
//! - The per-task pipeline: catalog lookup, storage download,
//!   timeout-bounded processing, upload, temp cleanup
//! - The media catalog seam and worker configuration

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod processor;

pub use catalog::{CatalogError, CatalogResult, InMemoryCatalog, MediaCatalog};
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::TaskExecutor;
pub use processor::ProcessingContext;
