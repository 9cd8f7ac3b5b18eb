//! [`PoolWorker`]: a single OS thread with exactly one task slot.
//!
//! Grounded on `original_source/src/rpp/thread_pool.h`'s `pool_worker`: no
//! per-worker queue, no work-stealing — a worker either holds zero or one
//! job. It blocks on a condvar waiting for a job, runs it to completion,
//! then either waits for the next job (up to `max_idle_time`) or, if none
//! arrives, reaps itself by exiting its thread. A reaped worker is
//! resurrected by [`crate::pool::ThreadPool`] simply spawning a fresh one
//! — the `PoolWorker` handle itself never comes back to life.

use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration as StdDuration;

use crate::condvar::PrecisionCondvar;
use crate::error::TaskError;
use crate::mutex::Mutex;
use crate::pool::task_handle::PoolTaskHandle;

/// Default idle timeout before an unused worker reaps itself, matching
/// `rpp::pool_worker::max_idle_timeout` (15 seconds).
pub const DEFAULT_MAX_IDLE_TIME: StdDuration = StdDuration::from_secs(15);

/// A unit of work assigned to a [`PoolWorker`]'s single task slot.
pub(crate) enum Job {
    /// A plain closure, run once.
    Generic(Box<dyn FnOnce() + Send>),
    /// One partition of a `parallel_for`: `func(start, end)`.
    Range {
        start: usize,
        end: usize,
        func: Arc<dyn Fn(usize, usize) + Send + Sync>,
    },
}

impl Job {
    fn run(self) {
        match self {
            Job::Generic(f) => f(),
            Job::Range { start, end, func } => func(start, end),
        }
    }
}

/// The lifecycle state of a [`PoolWorker`], observable for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for a job in its single slot.
    IdleWaiting,
    /// Currently executing a job.
    Running,
    /// Idle for longer than its timeout; the worker thread has exited.
    Reaped,
    /// [`PoolWorker::kill`] timed out waiting for the running job to
    /// finish; the OS thread was detached rather than joined and keeps
    /// running the job in the background until it completes on its own.
    Zombie,
}

struct Slot {
    job: Option<(Job, Option<PoolTaskHandle>)>,
}

/// A single worker thread with one task slot, grounded on `rpp::pool_worker`.
pub struct PoolWorker {
    name: String,
    slot: Mutex<Slot>,
    cv: PrecisionCondvar,
    state: Mutex<WorkerState>,
    state_cv: PrecisionCondvar,
    killed: AtomicBool,
    max_idle_time: StdDuration,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl PoolWorker {
    /// Spawns a new worker thread named `name`, idle-reaping after
    /// `max_idle_time` of inactivity.
    #[must_use]
    pub fn spawn(name: impl Into<String>, max_idle_time: StdDuration) -> Arc<Self> {
        let name = name.into();
        let worker = Arc::new(Self {
            name: name.clone(),
            slot: Mutex::new(Slot { job: None }),
            cv: PrecisionCondvar::new(),
            state: Mutex::new(WorkerState::IdleWaiting),
            state_cv: PrecisionCondvar::new(),
            killed: AtomicBool::new(false),
            max_idle_time,
            thread: Mutex::new(None),
        });

        let worker_loop = Arc::clone(&worker);
        let handle = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || worker_loop.run())
            .expect("failed to spawn pool worker thread");
        *worker.thread.lock() = Some(handle);
        worker
    }

    /// The worker's thread name (matches `pool_worker::name`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> WorkerState {
        *self.state.lock()
    }

    /// `true` if this worker is idle and able to accept a job right now.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state() == WorkerState::IdleWaiting && !self.killed.load(Ordering::Acquire)
    }

    /// `true` once this worker's thread has exited.
    #[must_use]
    pub fn is_reaped(&self) -> bool {
        self.state() == WorkerState::Reaped
    }

    /// `true` if [`PoolWorker::kill`] detached this worker's thread before
    /// its running job finished.
    #[must_use]
    pub fn is_zombie(&self) -> bool {
        self.state() == WorkerState::Zombie
    }

    /// Assigns a generic job to this worker's slot and wakes it. Must only
    /// be called on an idle worker (callers check [`PoolWorker::is_idle`]
    /// first); panics otherwise, since assigning over a running job would
    /// silently drop it.
    pub(crate) fn assign(&self, job: Job, handle: Option<PoolTaskHandle>) {
        let mut guard = self.slot.lock();
        assert!(guard.job.is_none(), "assigned a job to a worker that already has one");
        guard.job = Some((job, handle));
        drop(guard);
        self.cv.notify_one(&self.slot);
    }

    /// Forcibly stops the worker, waiting up to `timeout_ms` for its
    /// current job (if any) to finish before detaching. Ports
    /// `pool_worker::kill(timeoutMillis)`: returns `true` if the worker's
    /// thread was joined cleanly, `false` if the wait timed out and the
    /// thread was detached instead (see [`WorkerState::Zombie`]).
    pub fn kill(&self, timeout_ms: u64) -> bool {
        self.killed.store(true, Ordering::Release);
        self.cv.notify_all(&self.slot);

        let mut guard = self.state.lock();
        self.state_cv.wait_while_for(&mut guard, StdDuration::from_millis(timeout_ms), |s| {
            *s == WorkerState::Running
        });

        if *guard == WorkerState::Running {
            *guard = WorkerState::Zombie;
            drop(guard);
            self.thread.lock().take();
            false
        } else {
            drop(guard);
            if let Some(handle) = self.thread.lock().take() {
                let _ = handle.join();
            }
            true
        }
    }

    fn set_state(&self, new_state: WorkerState) {
        let mut guard = self.state.lock();
        *guard = new_state;
        drop(guard);
        self.state_cv.notify_all(&self.state);
    }

    fn run(self: Arc<Self>) {
        loop {
            let job_and_handle = {
                let mut guard = self.slot.lock();
                self.cv.wait_while_for(&mut guard, self.max_idle_time, |slot| {
                    slot.job.is_none() && !self.killed.load(Ordering::Acquire)
                });
                guard.job.take()
            };

            let Some((job, handle)) = job_and_handle else {
                self.set_state(WorkerState::Reaped);
                return;
            };

            self.set_state(WorkerState::Running);
            let result = panic::catch_unwind(panic::AssertUnwindSafe(|| job.run()));
            let error = result.err().map(|payload| TaskError::from_panic_payload(&*payload));
            if let Some(err) = &error {
                tracing::error!(worker = %self.name, error = %err, "pool task panicked");
            }
            if let Some(h) = handle {
                h.signal_finished(error);
            }
            self.set_state(WorkerState::IdleWaiting);
        }
    }
}
