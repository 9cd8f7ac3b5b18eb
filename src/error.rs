//! Error taxonomy for the execution core.
//!
//! Grounded on the teacher's `core/error.rs` (`SchedulerError`/`AppResult`
//! pair) and `core/worker_pool.rs` (`PoolError`), narrowed to the errors
//! the work-stealing-free pool and composable future actually produce.
//! Typed errors use `thiserror`; `anyhow` is kept as the catch-all for
//! integration/test code exactly as the teacher uses it.

use thiserror::Error;

/// `anyhow`'s blanket result alias, kept for parity with the teacher's
/// `core::error::AppResult` — used by integration glue code, not by the
/// library's own typed APIs.
pub type AppResult<T> = anyhow::Result<T>;

/// The outcome of a task that ran to completion abnormally: it panicked.
///
/// Captured via `std::panic::catch_unwind` at the worker boundary
/// (`pool::worker`), matching `spec.md`'s "task exceptions" error class.
#[derive(Debug, Error, Clone)]
#[error("task panicked: {message}")]
pub struct TaskError {
    /// The panic payload, downcast to a string where possible.
    pub message: String,
}

impl TaskError {
    /// Builds a `TaskError` from a caught panic payload.
    #[must_use]
    pub fn from_panic_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }

    /// Builds a `TaskError` from a plain message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors surfaced by [`crate::pool::ThreadPool`] and [`crate::pool::PoolWorker`].
///
/// Grounded on the teacher's `core/worker_pool.rs::PoolError`, trimmed to
/// the cases a single-slot, non-queueing pool can actually hit (no
/// `QueueFull`/`InsufficientCapacity` — the original admits a task to a
/// worker or spawns one, it never queues).
#[derive(Debug, Error, Clone)]
pub enum PoolError {
    /// The pool has been shut down and no longer accepts work.
    #[error("thread pool has been shut down")]
    Shutdown,
    /// A submitted closure panicked while running.
    #[error(transparent)]
    Task(#[from] TaskError),
    /// A worker failed to start (OS thread spawn failure).
    #[error("failed to spawn worker thread: {0}")]
    SpawnFailed(String),
    /// The supplied configuration was invalid.
    #[error("invalid thread pool configuration: {0}")]
    InvalidConfig(String),
}

/// The result of waiting on a [`crate::pool::PoolTaskHandle`] or
/// [`crate::future::Future`] with a bound: either it finished in time, or
/// the wait timed out. Timing out is not itself an error (spec.md §7.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The task finished before the deadline.
    Finished,
    /// The deadline elapsed first.
    TimedOut,
}
