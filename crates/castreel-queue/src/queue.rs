//! The task queue.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::debug;

use castreel_models::{MediaItemId, QueueStatus};

use crate::task::{Task, TaskCallback};

/// Unbounded, thread-safe FIFO of processing tasks.
///
/// Producers enqueue from any number of tasks/threads; a fixed set of
/// workers dequeues. Submission-to-dequeue order is FIFO; completion order
/// across workers is not guaranteed.
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<Inner>,
}

struct Inner {
    pending: Mutex<VecDeque<Task>>,
    notify: Notify,
    active: AtomicUsize,
    max_concurrent: usize,
}

impl TaskQueue {
    /// Create a queue for a worker pool of the given size.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                pending: Mutex::new(VecDeque::new()),
                notify: Notify::new(),
                active: AtomicUsize::new(0),
                max_concurrent,
            }),
        }
    }

    /// Enqueue a processing task for a media item.
    ///
    /// Returns the task handle immediately; processing happens on a worker.
    /// There is no uniqueness check: enqueueing the same media item twice
    /// yields two independent tasks.
    pub fn enqueue(&self, media_item_id: MediaItemId, callback: Option<TaskCallback>) -> Task {
        let task = Task::new(media_item_id, callback);
        self.lock_pending().push_back(task.clone());
        self.inner.notify.notify_one();

        debug!(
            task_id = %task.id(),
            media_item_id = %task.media_item_id(),
            "enqueued task"
        );
        task
    }

    /// Dequeue the oldest pending task, waiting up to `wait` for one to
    /// arrive. Returns `None` on timeout so callers can re-check their own
    /// loop conditions without busy-waiting.
    ///
    /// The returned lease counts the task as active until dropped.
    pub async fn dequeue(&self, wait: Duration) -> Option<LeasedTask> {
        if let Some(task) = self.pop_front() {
            return Some(self.lease(task));
        }

        // A permit stored by notify_one between the pop above and this
        // await makes notified() return immediately, so an enqueue in that
        // window is not lost.
        let _ = tokio::time::timeout(wait, self.inner.notify.notified()).await;
        self.pop_front().map(|task| self.lease(task))
    }

    /// Read-only snapshot for observability. `queue_size` counts pending
    /// tasks only, not those currently held by workers.
    pub fn status(&self) -> QueueStatus {
        QueueStatus {
            queue_size: self.lock_pending().len(),
            active_tasks: self.inner.active.load(Ordering::SeqCst),
            max_concurrent: self.inner.max_concurrent,
        }
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.lock_pending().len()
    }

    /// Whether no tasks are pending.
    pub fn is_empty(&self) -> bool {
        self.lock_pending().is_empty()
    }

    fn pop_front(&self) -> Option<Task> {
        self.lock_pending().pop_front()
    }

    fn lease(&self, task: Task) -> LeasedTask {
        self.inner.active.fetch_add(1, Ordering::SeqCst);
        LeasedTask {
            task,
            inner: Arc::clone(&self.inner),
        }
    }

    fn lock_pending(&self) -> MutexGuard<'_, VecDeque<Task>> {
        match self.inner.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// A dequeued task held by a worker.
///
/// The lease keeps the task counted in `active_tasks`; dropping it
/// decrements the counter. Each worker holds at most one lease, which is
/// what bounds `active_tasks` by the pool size.
pub struct LeasedTask {
    task: Task,
    inner: Arc<Inner>,
}

impl LeasedTask {
    /// The leased task.
    pub fn task(&self) -> &Task {
        &self.task
    }
}

impl Drop for LeasedTask {
    fn drop(&mut self) {
        self.inner.active.fetch_sub(1, Ordering::SeqCst);
    }
}
