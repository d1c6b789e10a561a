//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration. Read once at startup; not hot-reloadable.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of persistent workers
    pub pool_size: usize,
    /// Wall-clock budget for a single processing call
    pub processing_timeout: Duration,
    /// How long a worker blocks on an empty queue before re-checking its
    /// loop conditions
    pub poll_interval: Duration,
    /// Pause after an unexpected worker-loop error, so a recurring bug
    /// cannot spin a worker hot
    pub error_backoff: Duration,
    /// Directory for temporary input/output files
    pub work_dir: PathBuf,
    /// Upload processed outputs back to storage
    pub upload_processed: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            pool_size: 2,
            processing_timeout: Duration::from_secs(600), // 10 minutes
            poll_interval: Duration::from_millis(500),
            error_backoff: Duration::from_secs(5),
            work_dir: PathBuf::from("/tmp/castreel"),
            upload_processed: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            pool_size: std::env::var("WORKER_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            processing_timeout: Duration::from_secs(
                std::env::var("WORKER_PROCESSING_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            poll_interval: Duration::from_millis(
                std::env::var("WORKER_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(500),
            ),
            error_backoff: Duration::from_secs(
                std::env::var("WORKER_ERROR_BACKOFF_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/castreel")),
            upload_processed: std::env::var("WORKER_UPLOAD_PROCESSED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
        }
    }
}
