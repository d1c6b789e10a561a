//! Task lifecycle.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::warn;

use castreel_models::{MediaItemId, TaskId, TaskState};

/// Completion callback, invoked exactly once with the finalized task.
pub type TaskCallback = Box<dyn FnOnce(&Task) + Send + 'static>;

/// Handle to one media item's processing lifecycle.
///
/// Cloning is cheap; all clones share the same state. The worker that
/// dequeues a task is its only writer. Concurrent readers may observe a
/// snapshot that is one transition stale; this is a benign race, since
/// state updates are published atomically through the watch channel.
#[derive(Clone)]
pub struct Task {
    shared: Arc<Shared>,
}

struct Shared {
    id: TaskId,
    media_item_id: MediaItemId,
    created_at: DateTime<Utc>,
    state: watch::Sender<TaskState>,
    callback: Mutex<Option<TaskCallback>>,
}

impl Task {
    /// Create a queued task. Normally done via `TaskQueue::enqueue`.
    pub fn new(media_item_id: MediaItemId, callback: Option<TaskCallback>) -> Self {
        let (state, _) = watch::channel(TaskState::Queued);
        Self {
            shared: Arc::new(Shared {
                id: TaskId::new(),
                media_item_id,
                created_at: Utc::now(),
                state,
                callback: Mutex::new(callback),
            }),
        }
    }

    /// Task ID.
    pub fn id(&self) -> &TaskId {
        &self.shared.id
    }

    /// Media item this task processes.
    pub fn media_item_id(&self) -> &MediaItemId {
        &self.shared.media_item_id
    }

    /// Enqueue timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.shared.created_at
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> TaskState {
        self.shared.state.borrow().clone()
    }

    /// Whether the task has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.shared.state.borrow().is_terminal()
    }

    /// Wait until the task reaches a terminal state and return it.
    pub async fn wait(&self) -> TaskState {
        let mut rx = self.shared.state.subscribe();
        let result = match rx.wait_for(|s| s.is_terminal()).await {
            Ok(state) => state.clone(),
            // The sender lives alongside this handle; fall back to a snapshot.
            Err(_) => self.state(),
        };
        result
    }

    /// Transition `Queued` → `Processing`. Any other starting state is
    /// left untouched.
    pub fn begin(&self) {
        let advanced = self.shared.state.send_if_modified(|state| {
            if matches!(state, TaskState::Queued) {
                *state = TaskState::Processing;
                true
            } else {
                false
            }
        });
        if !advanced {
            warn!(task_id = %self.shared.id, state = %self.state(), "ignoring begin on non-queued task");
        }
    }

    /// Finalize the task as completed.
    pub fn complete(&self, output: PathBuf, stored_key: Option<String>) {
        self.finish(TaskState::Completed { output, stored_key });
    }

    /// Finalize the task as failed.
    pub fn fail(&self, error: impl Into<String>) {
        self.finish(TaskState::Failed {
            error: error.into(),
        });
    }

    /// Invoke the completion callback, if one was registered and has not
    /// run yet. Panics in the callback are caught and logged; they never
    /// affect task state or the caller.
    pub fn invoke_callback(&self) {
        let callback = self.lock_callback().take();
        if let Some(callback) = callback {
            if std::panic::catch_unwind(AssertUnwindSafe(|| callback(self))).is_err() {
                warn!(task_id = %self.shared.id, "task callback panicked");
            }
        }
    }

    /// Forward-only terminal transition; double finalization is ignored.
    fn finish(&self, terminal: TaskState) {
        let advanced = self.shared.state.send_if_modified(|state| {
            if state.is_terminal() {
                false
            } else {
                *state = terminal.clone();
                true
            }
        });
        if !advanced {
            warn!(task_id = %self.shared.id, state = %self.state(), "ignoring finalize on terminal task");
        }
    }

    fn lock_callback(&self) -> MutexGuard<'_, Option<TaskCallback>> {
        match self.shared.callback.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.shared.id)
            .field("media_item_id", &self.shared.media_item_id)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_forward_only_transitions() {
        let task = Task::new(MediaItemId::from("item-1"), None);
        assert_eq!(task.state(), TaskState::Queued);

        task.begin();
        assert_eq!(task.state(), TaskState::Processing);

        // begin again is a no-op
        task.begin();
        assert_eq!(task.state(), TaskState::Processing);

        task.complete(PathBuf::from("/tmp/out.mp4"), None);
        assert!(task.is_terminal());

        // finalizing a terminal task changes nothing
        task.fail("too late");
        assert_eq!(
            task.state(),
            TaskState::Completed {
                output: PathBuf::from("/tmp/out.mp4"),
                stored_key: None,
            }
        );
    }

    #[test]
    fn test_callback_runs_exactly_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_in_cb = Arc::clone(&count);
        let task = Task::new(
            MediaItemId::from("item-1"),
            Some(Box::new(move |task| {
                assert!(task.is_terminal());
                count_in_cb.fetch_add(1, Ordering::SeqCst);
            })),
        );

        task.begin();
        task.fail("boom");
        task.invoke_callback();
        task.invoke_callback();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_panic_is_contained() {
        let task = Task::new(
            MediaItemId::from("item-1"),
            Some(Box::new(|_| panic!("callback bug"))),
        );

        task.begin();
        task.complete(PathBuf::from("/tmp/out.mp4"), None);
        task.invoke_callback();

        // state survives the panicking callback
        assert!(task.is_terminal());
    }

    #[tokio::test]
    async fn test_wait_resolves_on_finalize() {
        let task = Task::new(MediaItemId::from("item-1"), None);
        let waiter = task.clone();

        let handle = tokio::spawn(async move { waiter.wait().await });

        task.begin();
        task.fail("bad codec");

        let state = handle.await.unwrap();
        assert_eq!(state.error(), Some("bad codec"));
    }
}
