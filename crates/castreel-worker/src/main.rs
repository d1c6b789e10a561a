//! Media processing worker binary.
//!
//! Batch runner: loads a JSON media manifest into the in-memory catalog,
//! enqueues every record, waits for terminal states, and logs a summary.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use castreel_media::FfmpegTranscoder;
use castreel_models::TaskState;
use castreel_queue::TaskQueue;
use castreel_storage::{LocalStore, MediaStore, S3Store};
use castreel_worker::{
    catalog::load_manifest, InMemoryCatalog, ProcessingContext, TaskExecutor, WorkerConfig,
    WorkerError, WorkerResult,
};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,castreel=debug"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting castreel-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    if let Err(e) = run(config).await {
        error!("Worker failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: WorkerConfig) -> WorkerResult<()> {
    let storage = storage_from_env().await?;

    let manifest_path = std::env::var("CATALOG_MANIFEST")
        .unwrap_or_else(|_| "media-manifest.json".to_string());
    let records = load_manifest(&manifest_path).await?;
    info!("Loaded {} media records from {}", records.len(), manifest_path);

    let ids: Vec<_> = records.iter().map(|r| r.id.clone()).collect();
    let catalog = Arc::new(InMemoryCatalog::from_records(records));

    let ctx = ProcessingContext::new(
        config.clone(),
        catalog,
        storage,
        Arc::new(FfmpegTranscoder::new()),
    )
    .await?;

    let queue = TaskQueue::new(config.pool_size);
    let executor = TaskExecutor::new(queue.clone(), Arc::new(ctx));
    executor.start();

    let tasks: Vec<_> = ids
        .into_iter()
        .map(|id| queue.enqueue(id, None))
        .collect();

    let wait_all = async {
        let mut completed = 0usize;
        let mut failed = 0usize;
        for task in &tasks {
            match task.wait().await {
                TaskState::Completed { output, stored_key } => {
                    completed += 1;
                    info!(
                        media_item_id = %task.media_item_id(),
                        output = %output.display(),
                        stored_key = stored_key.as_deref().unwrap_or("-"),
                        "media item processed"
                    );
                }
                TaskState::Failed { error } => {
                    failed += 1;
                    warn!(
                        media_item_id = %task.media_item_id(),
                        error = %error,
                        "media item failed"
                    );
                }
                other => warn!(
                    media_item_id = %task.media_item_id(),
                    state = %other,
                    "unexpected non-terminal state"
                ),
            }
        }
        (completed, failed)
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, abandoning in-flight tasks");
        }
        (completed, failed) = wait_all => {
            info!(
                "Processed {} media items: {} completed, {} failed",
                tasks.len(),
                completed,
                failed
            );
        }
    }

    executor.shutdown();
    info!("Worker shutdown complete");
    Ok(())
}

async fn storage_from_env() -> WorkerResult<Arc<dyn MediaStore>> {
    let backend = std::env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".to_string());
    match backend.as_str() {
        "s3" => Ok(Arc::new(S3Store::from_env()?)),
        "local" => {
            let root = std::env::var("MEDIA_ROOT").unwrap_or_else(|_| "./media".to_string());
            Ok(Arc::new(LocalStore::new(root).await?))
        }
        other => Err(WorkerError::config(format!(
            "unknown STORAGE_BACKEND: {}",
            other
        ))),
    }
}
