//! [`PoolTaskHandle`]: a shared completion signal for a task running on a
//! [`crate::pool::ThreadPool`] worker.
//!
//! Grounded on `original_source/src/rpp/thread_pool.h`'s `pool_task_handle`
//! (a `shared_ptr<state>` with `wait`/`wait_check`/`signal_finished`), used
//! internally by [`crate::pool::ThreadPool::parallel_for`] to know when
//! every partition has finished, and exposed publicly for callers that
//! submit bare closures and only care "is it done", not "what did it
//! return" (use [`crate::future::Future`] when a return value matters).

use std::sync::Arc;
use std::time::Duration;

use crate::condvar::PrecisionCondvar;
use crate::error::{TaskError, WaitOutcome};
use crate::mutex::Mutex;

struct State {
    finished: bool,
    error: Option<TaskError>,
}

struct Shared {
    state: Mutex<State>,
    cv: PrecisionCondvar,
}

/// A cheaply-clonable handle that becomes signalled once the task it
/// tracks completes (successfully or by panicking — this handle does not
/// carry the error, only the fact that the task is no longer running).
#[derive(Clone)]
pub struct PoolTaskHandle {
    shared: Arc<Shared>,
}

impl PoolTaskHandle {
    /// Creates a new, unfinished handle.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State { finished: false, error: None }),
                cv: PrecisionCondvar::new(),
            }),
        }
    }

    /// `true` once [`PoolTaskHandle::signal_finished`] has been called.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.shared.state.lock().finished
    }

    /// Blocks until the task finishes.
    pub fn wait(&self) {
        let mut guard = self.shared.state.lock();
        self.shared.cv.wait_while(&mut guard, |state| !state.finished);
    }

    /// Blocks until the task finishes or `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> WaitOutcome {
        let mut guard = self.shared.state.lock();
        if guard.finished {
            return WaitOutcome::Finished;
        }
        match self.shared.cv.wait_while_for(&mut guard, timeout, |state| !state.finished) {
            crate::condvar::WaitResult::Notified => WaitOutcome::Finished,
            crate::condvar::WaitResult::TimedOut => WaitOutcome::TimedOut,
        }
    }

    /// Blocks until the task finishes, then reports whether it failed.
    ///
    /// Ports `pool_task_handle::wait_check`: returns `true` if the task
    /// completed without panicking, `false` otherwise, writing the first
    /// captured error into `out_err` in the failing case.
    pub fn wait_check(&self, out_err: &mut Option<TaskError>) -> bool {
        self.wait();
        let guard = self.shared.state.lock();
        match &guard.error {
            Some(err) => {
                *out_err = Some(err.clone());
                false
            }
            None => true,
        }
    }

    /// Marks the task as finished and wakes every waiter. Called exactly
    /// once by the worker running the tracked task, carrying the task's
    /// panic payload (if any) as `error`.
    pub fn signal_finished(&self, error: Option<TaskError>) {
        let mut guard = self.shared.state.lock();
        guard.finished = true;
        guard.error = error;
        drop(guard);
        self.shared.cv.notify_all(&self.shared.state);
    }
}

impl Default for PoolTaskHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_initially_unfinished() {
        let handle = PoolTaskHandle::new();
        assert!(!handle.is_finished());
    }

    #[test]
    fn test_signal_finished_wakes_waiter() {
        let handle = PoolTaskHandle::new();
        let handle2 = handle.clone();
        let joiner = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            handle2.signal_finished(None);
        });
        handle.wait();
        assert!(handle.is_finished());
        joiner.join().unwrap();
    }

    #[test]
    fn test_wait_timeout_expires() {
        let handle = PoolTaskHandle::new();
        assert_eq!(handle.wait_timeout(Duration::from_millis(10)), WaitOutcome::TimedOut);
    }

    #[test]
    fn test_wait_timeout_finishes_in_time() {
        let handle = PoolTaskHandle::new();
        handle.signal_finished(None);
        assert_eq!(handle.wait_timeout(Duration::from_millis(10)), WaitOutcome::Finished);
    }

    #[test]
    fn test_wait_check_true_when_no_error() {
        let handle = PoolTaskHandle::new();
        handle.signal_finished(None);
        let mut err = None;
        assert!(handle.wait_check(&mut err));
        assert!(err.is_none());
    }

    #[test]
    fn test_wait_check_false_and_reports_error() {
        let handle = PoolTaskHandle::new();
        handle.signal_finished(Some(TaskError::new("boom")));
        let mut err = None;
        assert!(!handle.wait_check(&mut err));
        assert_eq!(err.unwrap().message, "boom");
    }
}
