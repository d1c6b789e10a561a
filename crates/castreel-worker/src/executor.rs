//! The worker pool.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use metrics::{counter, gauge};
use tokio::sync::watch;
use tracing::{debug, error, info};

use castreel_models::TaskState;
use castreel_queue::TaskQueue;

use crate::processor::{process_task, ProcessingContext};

/// Fixed-size pool of workers draining the task queue.
///
/// Workers are detached tokio tasks and are never joined; they stop at the
/// next poll boundary once `shutdown` is called or the executor is dropped.
/// There is no drain protocol: in-flight work is abandoned with the
/// process.
pub struct TaskExecutor {
    queue: TaskQueue,
    ctx: Arc<ProcessingContext>,
    shutdown: watch::Sender<bool>,
}

impl TaskExecutor {
    /// Create an executor over the given queue and context.
    pub fn new(queue: TaskQueue, ctx: Arc<ProcessingContext>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            queue,
            ctx,
            shutdown,
        }
    }

    /// Spawn the worker pool.
    pub fn start(&self) {
        let pool_size = self.ctx.config.pool_size;
        info!("Starting {} workers", pool_size);

        for worker_id in 0..pool_size {
            let queue = self.queue.clone();
            let ctx = Arc::clone(&self.ctx);
            let shutdown = self.shutdown.subscribe();
            tokio::spawn(worker_loop(worker_id, queue, ctx, shutdown));
        }
    }

    /// Signal workers to stop at their next poll boundary.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// The queue this executor drains.
    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: TaskQueue,
    ctx: Arc<ProcessingContext>,
    shutdown: watch::Receiver<bool>,
) {
    debug!(worker_id, "worker started");

    loop {
        // A closed channel means the executor is gone; stop either way.
        if shutdown.has_changed().is_err() || *shutdown.borrow() {
            break;
        }

        let leased = match queue.dequeue(ctx.config.poll_interval).await {
            Some(leased) => leased,
            None => continue,
        };
        let task = leased.task().clone();

        // The pipeline contains every expected failure on the task itself.
        // A panic here is a bug in our own bookkeeping; record it on the
        // task and back off so a recurring one cannot spin this worker hot.
        let panicked = AssertUnwindSafe(process_task(&ctx, &task))
            .catch_unwind()
            .await
            .is_err();
        if panicked {
            error!(worker_id, task_id = %task.id(), "task pipeline panicked");
            task.fail("internal error: task pipeline panicked");
        }

        drop(leased);
        task.invoke_callback();

        match task.state() {
            TaskState::Failed { .. } => {
                counter!("castreel_tasks_failed_total").increment(1);
            }
            _ => {
                counter!("castreel_tasks_completed_total").increment(1);
            }
        }
        gauge!("castreel_active_tasks").set(queue.status().active_tasks as f64);

        if panicked {
            tokio::time::sleep(ctx.config.error_backoff).await;
        }
    }

    debug!(worker_id, "worker stopped");
}
