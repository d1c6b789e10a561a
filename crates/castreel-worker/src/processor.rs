//! Per-task processing pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use castreel_media::MediaProcessor;
use castreel_queue::Task;
use castreel_storage::MediaStore;
use castreel_models::MediaRecord;

use crate::catalog::MediaCatalog;
use crate::config::WorkerConfig;
use crate::error::WorkerResult;

/// Context shared by all workers.
pub struct ProcessingContext {
    pub config: WorkerConfig,
    pub catalog: Arc<dyn MediaCatalog>,
    pub storage: Arc<dyn MediaStore>,
    pub processor: Arc<dyn MediaProcessor>,
}

impl ProcessingContext {
    pub async fn new(
        config: WorkerConfig,
        catalog: Arc<dyn MediaCatalog>,
        storage: Arc<dyn MediaStore>,
        processor: Arc<dyn MediaProcessor>,
    ) -> WorkerResult<Self> {
        tokio::fs::create_dir_all(&config.work_dir).await?;

        Ok(Self {
            config,
            catalog,
            storage,
            processor,
        })
    }
}

/// Run one task through the pipeline: resolve the media record, download
/// the raw file, process it under the configured timeout, optionally upload
/// the output, clean up the temp input, and finalize the task.
///
/// Every failure mode is converted into a terminal `Failed` state on the
/// task; this function never returns an error and never panics on the
/// expected paths.
pub(crate) async fn process_task(ctx: &ProcessingContext, task: &Task) {
    task.begin();
    info!(task_id = %task.id(), media_item_id = %task.media_item_id(), "processing task");

    let record = match ctx.catalog.find(task.media_item_id()).await {
        Ok(record) => record,
        Err(e) => {
            task.fail(format!("media item lookup failed: {}", e));
            return;
        }
    };

    let input_path = input_path_for(ctx, &record, task);
    if let Err(e) = ctx.storage.download_to(&record.storage_key, &input_path).await {
        remove_temp_file(&input_path).await;
        task.fail(format!("storage read failed: {}", e));
        return;
    }

    let outcome = run_processor(ctx, input_path.clone()).await;

    let outcome = match outcome {
        Ok(output) if ctx.config.upload_processed => {
            match upload_output(ctx, &record, &output).await {
                Ok(stored_key) => Ok((output, Some(stored_key))),
                Err(error) => Err(error),
            }
        }
        Ok(output) => Ok((output, None)),
        Err(error) => Err(error),
    };

    remove_temp_file(&input_path).await;

    match outcome {
        Ok((output, stored_key)) => {
            info!(task_id = %task.id(), output = %output.display(), "task completed");
            task.complete(output, stored_key);
        }
        Err(error) => {
            warn!(task_id = %task.id(), error = %error, "task failed");
            task.fail(error);
        }
    }
}

/// Invoke the processor on an isolated spawned task, bounded by the
/// configured timeout. On expiry the spawned task is abandoned, not
/// aborted: the processing call may keep running (and consuming resources)
/// after its task has been failed.
async fn run_processor(ctx: &ProcessingContext, input: PathBuf) -> Result<PathBuf, String> {
    let processor = Arc::clone(&ctx.processor);
    let timeout = ctx.config.processing_timeout;

    let handle = tokio::spawn(async move { processor.process(&input).await });

    match tokio::time::timeout(timeout, handle).await {
        Err(_) => Err(format!(
            "processing timed out after {}s",
            timeout.as_secs_f64()
        )),
        Ok(Err(join_error)) => Err(format!("processing task aborted: {}", join_error)),
        Ok(Ok(Err(e))) => Err(format!("processing failed: {}", e)),
        Ok(Ok(Ok(output))) => Ok(output),
    }
}

async fn upload_output(
    ctx: &ProcessingContext,
    record: &MediaRecord,
    output: &Path,
) -> Result<String, String> {
    let filename = output
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("output.mp4");
    let stored_key = format!("processed/{}/{}", record.id, filename);

    match ctx
        .storage
        .upload_file(output, &stored_key, &record.content_type)
        .await
    {
        Ok(()) => Ok(stored_key),
        Err(e) => Err(format!("upload failed: {}", e)),
    }
}

/// Unique temp path for a task's raw input: media item id plus task id, so
/// concurrent tasks for the same item never collide.
fn input_path_for(ctx: &ProcessingContext, record: &MediaRecord, task: &Task) -> PathBuf {
    let extension = record.extension().unwrap_or("mp4");
    ctx.config
        .work_dir
        .join(format!("{}-{}.{}", record.id, task.id(), extension))
}

/// Idempotent temp-file removal; an already-absent file is fine.
async fn remove_temp_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("failed to remove temp file {}: {}", path.display(), e),
    }
}
