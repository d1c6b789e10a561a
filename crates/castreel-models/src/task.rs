//! Processing task state and queue status.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Unique identifier for a processing task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a new random task ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of a processing task.
///
/// Transitions are forward-only: `Queued` → `Processing` → one of the
/// terminal variants. Payloads live on the variants, so a result can only
/// be read off a completed task and an error off a failed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskState {
    /// Task is waiting in the queue
    #[default]
    Queued,
    /// Task has been picked up by a worker
    Processing,
    /// Processing finished successfully
    Completed {
        /// Local path of the processed output
        output: PathBuf,
        /// Storage key of the uploaded output, when uploading is enabled
        #[serde(skip_serializing_if = "Option::is_none")]
        stored_key: Option<String>,
    },
    /// Processing failed
    Failed {
        /// Human-readable failure description
        error: String,
    },
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Queued => "queued",
            TaskState::Processing => "processing",
            TaskState::Completed { .. } => "completed",
            TaskState::Failed { .. } => "failed",
        }
    }

    /// Whether the task has reached a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed { .. } | TaskState::Failed { .. })
    }

    /// Failure description, when failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            TaskState::Failed { error } => Some(error),
            _ => None,
        }
    }

    /// Processed output path, when completed.
    pub fn output(&self) -> Option<&PathBuf> {
        match self {
            TaskState::Completed { output, .. } => Some(output),
            _ => None,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read-only snapshot of the task queue, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QueueStatus {
    /// Pending tasks waiting in the FIFO (excludes in-flight tasks)
    pub queue_size: usize,
    /// Tasks currently held by workers
    pub active_tasks: usize,
    /// Configured worker pool size
    pub max_concurrent: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!TaskState::Queued.is_terminal());
        assert!(!TaskState::Processing.is_terminal());
        assert!(TaskState::Completed {
            output: PathBuf::from("/tmp/out.mp4"),
            stored_key: None,
        }
        .is_terminal());
        assert!(TaskState::Failed {
            error: "boom".to_string(),
        }
        .is_terminal());
    }

    #[test]
    fn test_variant_payloads() {
        let completed = TaskState::Completed {
            output: PathBuf::from("/tmp/out.mp4"),
            stored_key: Some("processed/item/out.mp4".to_string()),
        };
        assert_eq!(completed.output(), Some(&PathBuf::from("/tmp/out.mp4")));
        assert_eq!(completed.error(), None);

        let failed = TaskState::Failed {
            error: "bad codec".to_string(),
        };
        assert_eq!(failed.error(), Some("bad codec"));
        assert_eq!(failed.output(), None);
    }

    #[test]
    fn test_state_serde_tag() {
        let json = serde_json::to_value(&TaskState::Failed {
            error: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "boom");
    }
}
