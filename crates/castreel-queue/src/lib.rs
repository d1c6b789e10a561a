//! In-memory FIFO task queue for media processing.
//!
//! This crate provides:
//! - `Task`: one media item's processing lifecycle, with snapshot/await
//!   state access and a single-shot completion callback
//! - `TaskQueue`: the thread-safe FIFO workers drain, with active-task
//!   accounting and a status snapshot
//!
//! Tasks live only in memory; a process restart loses queued and in-flight
//! tasks. There is no retry policy and no priority ordering.

pub mod queue;
pub mod task;

pub use queue::{LeasedTask, TaskQueue};
pub use task::{Task, TaskCallback};
