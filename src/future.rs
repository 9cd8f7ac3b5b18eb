//! A composable, chainable future/promise pair with `async`/`await`
//! interop: [`Future`] and [`Promise`].
//!
//! Grounded on `original_source/src/rpp/future.h`'s `cfuture`/`cpromise`.
//! `cpromise::compose` runs a task and destroys it *before* publishing the
//! result, so a continuation chained with `.then()` never observes the
//! producing closure's captured state outliving the value it produced —
//! Rust's `FnOnce::call_once` gives this for free: calling a `FnOnce` by
//! value drops its captured environment as part of returning, before the
//! caller can act on the return value.
//!
//! Unlike the C++20-coroutine interop described in `future.h` (manual
//! `await_ready`/`await_suspend`/`await_resume`), [`Future`] implements
//! `std::future::Future` directly, so `.await` works on any executor
//! (including none at all — see [`Future::wait`]/[`Future::get`] for the
//! blocking path used outside `async`).

use std::future::Future as StdFuture;
use std::panic;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use crate::condvar::PrecisionCondvar;
use crate::error::TaskError;
use crate::mutex::Mutex;

enum Slot<T> {
    Pending,
    Ready(Result<T, TaskError>),
    Taken,
}

struct State<T> {
    slot: Slot<T>,
    waker: Option<Waker>,
    continuation: Option<Box<dyn FnOnce(Result<T, TaskError>) + Send>>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    cv: PrecisionCondvar,
}

impl<T> Shared<T> {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                slot: Slot::Pending,
                waker: None,
                continuation: None,
            }),
            cv: PrecisionCondvar::new(),
        })
    }

    /// Publishes `result`. If a continuation was registered, hands the
    /// result to it directly (outside the lock) instead of storing it.
    fn complete(self: &Arc<Self>, result: Result<T, TaskError>) {
        let mut guard = self.state.lock();
        let continuation = guard.continuation.take();
        if continuation.is_none() {
            guard.slot = Slot::Ready(result);
        }
        let waker = guard.waker.take();
        drop(guard);

        if let Some(cont) = continuation {
            cont(result);
        }
        if let Some(w) = waker {
            w.wake();
        }
        self.cv.notify_all(&self.state);
    }
}

/// The producing half of a [`Future`]/`Promise` pair.
///
/// Grounded on `rpp::cpromise<T>`.
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Send + 'static> Promise<T> {
    /// Creates a connected `(Promise, Future)` pair.
    #[must_use]
    pub fn new() -> (Self, Future<T>) {
        let shared = Shared::new();
        (
            Self {
                shared: Arc::clone(&shared),
            },
            Future {
                shared,
                observed: false,
            },
        )
    }

    /// Publishes a successful value.
    pub fn set_value(self, value: T) {
        self.shared.complete(Ok(value));
    }

    /// Publishes a task failure.
    pub fn set_error(self, error: TaskError) {
        self.shared.complete(Err(error));
    }

    /// Runs `task`, catching panics, and publishes its outcome.
    ///
    /// Ports `cpromise::compose`: the task (and everything it captured) is
    /// dropped before `complete` runs, per the module doc comment above.
    pub fn compose<F>(self, task: F)
    where
        F: FnOnce() -> T + std::panic::UnwindSafe,
    {
        let result = panic::catch_unwind(task).map_err(|payload| TaskError::from_panic_payload(&*payload));
        self.shared.complete(result);
    }
}

/// The consuming half of a [`Promise`]/`Future` pair. Single-consumer:
/// `then`/`get`/`wait`/`detach` all take `self` by value.
///
/// Grounded on `rpp::cfuture<T>`.
#[must_use = "a Future does nothing unless awaited, gotten, or detached"]
pub struct Future<T> {
    shared: Arc<Shared<T>>,
    observed: bool,
}

impl<T: Send + 'static> Future<T> {
    /// Creates a future that is immediately ready with `value`. Ports
    /// `rpp::make_ready_future`.
    #[must_use]
    pub fn ready(value: T) -> Self {
        let (promise, future) = Promise::new();
        promise.set_value(value);
        future
    }

    /// Creates a future that is immediately failed with `error`. Ports
    /// `rpp::make_exceptional_future`.
    #[must_use]
    pub fn failed(error: TaskError) -> Self {
        let (promise, future) = Promise::new();
        promise.set_error(error);
        future
    }

    /// Blocks until a result is available, consuming the future.
    pub fn get(mut self) -> Result<T, TaskError> {
        self.observed = true;
        let mut guard = self.shared.state.lock();
        self.shared.cv.wait_while(&mut guard, |st| matches!(st.slot, Slot::Pending));
        match std::mem::replace(&mut guard.slot, Slot::Taken) {
            Slot::Ready(result) => result,
            _ => unreachable!("woken without a ready slot"),
        }
    }

    /// Blocks without consuming, for callers that want to check readiness
    /// before calling [`Future::get`].
    pub fn wait(&self) {
        let mut guard = self.shared.state.lock();
        self.shared.cv.wait_while(&mut guard, |st| matches!(st.slot, Slot::Pending));
    }

    /// `true` if the result is already available.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !matches!(self.shared.state.lock().slot, Slot::Pending)
    }

    /// Chains a continuation that runs once this future resolves
    /// successfully, producing a new `Future<U>`. On failure, the error
    /// propagates to the returned future without running `f`. Ports
    /// `cfuture::then`.
    pub fn then<U, F>(mut self, f: F) -> Future<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.observed = true;
        let (promise, next) = Promise::new();
        let mut guard = self.shared.state.lock();
        match std::mem::replace(&mut guard.slot, Slot::Taken) {
            Slot::Ready(result) => {
                drop(guard);
                match result {
                    Ok(value) => promise.set_value(f(value)),
                    Err(e) => promise.set_error(e),
                }
            }
            Slot::Pending => {
                guard.continuation = Some(Box::new(move |result| match result {
                    Ok(value) => promise.set_value(f(value)),
                    Err(e) => promise.set_error(e),
                }));
            }
            Slot::Taken => unreachable!("future polled twice"),
        }
        next
    }

    /// Like [`Future::then`], but `f` receives the full `Result`, so it
    /// can observe and recover from failure. Ports `cfuture::continue_with`.
    pub fn continue_with<U, F>(mut self, f: F) -> Future<U>
    where
        U: Send + 'static,
        F: FnOnce(Result<T, TaskError>) -> U + Send + 'static,
    {
        self.observed = true;
        let (promise, next) = Promise::new();
        let mut guard = self.shared.state.lock();
        match std::mem::replace(&mut guard.slot, Slot::Taken) {
            Slot::Ready(result) => {
                drop(guard);
                promise.set_value(f(result));
            }
            Slot::Pending => {
                guard.continuation = Some(Box::new(move |result| {
                    promise.set_value(f(result));
                }));
            }
            Slot::Taken => unreachable!("future polled twice"),
        }
        next
    }

    /// Discards the future without requiring the caller to observe its
    /// result. Unlike simply dropping a `Future`, this does not trigger
    /// the abandoned-future check in [`Future`]'s `Drop` impl. Ports
    /// `cfuture::detach`.
    pub fn detach(mut self) {
        self.observed = true;
    }

    /// Waits on `self`, then resolves to `next`'s value, discarding
    /// `self`'s. If `self` fails, `next` is detached (never awaited) and
    /// the failure propagates instead. Ports `cfuture::then(nextFuture)`.
    ///
    /// Runs the wait on a pool worker rather than inline, since `self`
    /// and `next` may both still be pending.
    pub fn then_next<U: Send + 'static>(self, next: Future<U>) -> Future<U> {
        let (promise, result) = Promise::new();
        crate::pool::global().parallel_task(move || match self.get() {
            Ok(_) => match next.get() {
                Ok(value) => promise.set_value(value),
                Err(e) => promise.set_error(e),
            },
            Err(e) => {
                next.detach();
                promise.set_error(e);
            }
        });
        result
    }

    /// Downcasts a `Future<T>` into a `Future<()>` by discarding the
    /// value on success; a failure still propagates. Ports `cfuture`'s
    /// no-argument `then()` overload.
    #[must_use]
    pub fn into_unit(self) -> Future<()> {
        self.then(|_| ())
    }
}

impl<T> Drop for Future<T> {
    fn drop(&mut self) {
        if self.observed {
            return;
        }
        let still_pending = matches!(self.shared.state.lock().slot, Slot::Pending);
        if still_pending {
            tracing::error!("future dropped while its task was still running and unobserved; aborting");
            std::process::abort();
        }
    }
}

impl<T: Send + 'static> StdFuture for Future<T> {
    type Output = Result<T, TaskError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.observed = true;
        let mut guard = this.shared.state.lock();
        match &guard.slot {
            Slot::Pending => {
                guard.waker = Some(cx.waker().clone());
                Poll::Pending
            }
            Slot::Ready(_) => match std::mem::replace(&mut guard.slot, Slot::Taken) {
                Slot::Ready(result) => Poll::Ready(result),
                _ => unreachable!(),
            },
            Slot::Taken => panic!("Future polled after completion"),
        }
    }
}

/// Waits for every future in `futures` to resolve, discarding the
/// results. Ports `rpp::wait_all`.
pub fn wait_all<T: Send + 'static>(futures: Vec<Future<T>>) {
    for f in futures {
        f.wait();
    }
}

/// Waits for every future in `futures` and collects their results in
/// order. Ports `rpp::get_all`.
pub fn get_all<T: Send + 'static>(futures: Vec<Future<T>>) -> Vec<Result<T, TaskError>> {
    futures.into_iter().map(Future::get).collect()
}

/// Launches `launcher(item)` for every item in `items` on the global
/// pool and collects the resulting futures' outcomes in order. Ports
/// `rpp::run_tasks`, the fan-out sibling of `wait_all`/`get_all` that
/// also owns the submission step.
pub fn run_tasks<I, T, F>(items: I, launcher: F) -> Vec<Result<T, TaskError>>
where
    I: IntoIterator,
    I::Item: Send + 'static,
    T: Send + 'static,
    F: Fn(I::Item) -> T + Send + Sync + 'static,
{
    let launcher = Arc::new(launcher);
    let futures: Vec<Future<T>> = items
        .into_iter()
        .map(|item| {
            let launcher = Arc::clone(&launcher);
            spawn_blocking_awaiter(move || launcher(item))
        })
        .collect();
    get_all(futures)
}

/// Submits a zero-argument closure to the global pool and returns a
/// `Future` that resolves to its result (or the panic it raised). The
/// Rust-idiomatic stand-in for the coroutine lambda awaiter described
/// in `original_source/src/rpp/future.h`'s "Additional awaiters" section
/// — `.await`-compatible via `Future`'s `std::future::Future` impl.
pub fn spawn_blocking_awaiter<F, T>(f: F) -> Future<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (promise, future) = Promise::new();
    // `AssertUnwindSafe` rather than a `F: UnwindSafe` bound: generic `F`
    // captured from caller code (e.g. `run_tasks`'s per-item closure) has
    // no way to prove unwind-safety at the call site, and `compose`
    // already isolates the panic into a `TaskError` before it can touch
    // anything `f` closed over.
    crate::pool::global().parallel_task(move || promise.compose(std::panic::AssertUnwindSafe(f)));
    future
}

/// Resolves after sleeping for `duration` on a pool worker. The
/// Rust-idiomatic stand-in for the coroutine duration awaiter described
/// alongside the lambda awaiter in `future.h`.
pub fn sleep_awaiter(duration: std::time::Duration) -> Future<()> {
    spawn_blocking_awaiter(move || std::thread::sleep(duration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    #[test]
    fn test_ready_future_get() {
        let f = Future::ready(42);
        assert_eq!(f.get().unwrap(), 42);
    }

    #[test]
    fn test_failed_future_get() {
        let f: Future<i32> = Future::failed(TaskError::new("nope"));
        assert_eq!(f.get().unwrap_err().message, "nope");
    }

    #[test]
    fn test_promise_set_value_unblocks_waiting_thread() {
        let (promise, future) = Promise::new();
        let handle = thread::spawn(move || future.get());
        thread::sleep(std::time::Duration::from_millis(10));
        promise.set_value(7);
        assert_eq!(handle.join().unwrap().unwrap(), 7);
    }

    #[test]
    fn test_then_chains_after_completion() {
        let f = Future::ready(10);
        let chained = f.then(|x| x * 2);
        assert_eq!(chained.get().unwrap(), 20);
    }

    #[test]
    fn test_then_chains_before_completion() {
        let (promise, future) = Promise::new();
        let chained = future.then(|x: i32| x + 1);
        let handle = thread::spawn(move || chained.get());
        thread::sleep(std::time::Duration::from_millis(10));
        promise.set_value(41);
        assert_eq!(handle.join().unwrap().unwrap(), 42);
    }

    #[test]
    fn test_then_propagates_error_without_calling_continuation() {
        let called = Arc::new(AtomicBool::new(false));
        let called2 = Arc::clone(&called);
        let f: Future<i32> = Future::failed(TaskError::new("boom"));
        let chained = f.then(move |x| {
            called2.store(true, Ordering::SeqCst);
            x
        });
        assert_eq!(chained.get().unwrap_err().message, "boom");
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_continue_with_observes_result() {
        let f: Future<i32> = Future::failed(TaskError::new("boom"));
        let recovered = f.continue_with(|r| r.unwrap_or(-1));
        assert_eq!(recovered.get().unwrap(), -1);
    }

    #[test]
    fn test_compose_runs_task_and_catches_panics() {
        let (promise, future) = Promise::new();
        promise.compose(|| 5 + 5);
        assert_eq!(future.get().unwrap(), 10);

        let (promise2, future2): (Promise<i32>, Future<i32>) = Promise::new();
        promise2.compose(|| panic!("kaboom"));
        assert!(future2.get().is_err());
    }

    #[test]
    fn test_detach_does_not_abort_on_pending_drop() {
        let (_promise, future) = Promise::<i32>::new();
        future.detach();
    }

    #[test]
    fn test_wait_all_and_get_all() {
        let futures: Vec<Future<i32>> = (0..5).map(Future::ready).collect();
        let results = get_all(futures);
        assert_eq!(
            results.into_iter().map(Result::unwrap).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
    }

    #[test]
    fn test_future_is_ready() {
        let (promise, future) = Promise::new();
        assert!(!future.is_ready());
        promise.set_value(1);
        assert!(future.is_ready());
    }

    #[test]
    fn test_then_next_waits_on_self_then_returns_other_futures_value() {
        let (promise, future) = Promise::<i32>::new();
        let next = Future::ready("done");
        let chained = future.then_next(next);

        thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(10));
            promise.set_value(1);
        });
        assert_eq!(chained.get().unwrap(), "done");
    }

    #[test]
    fn test_then_next_propagates_self_failure_without_waiting_on_next() {
        let f: Future<i32> = Future::failed(TaskError::new("boom"));
        let next = Future::ready("unreachable");
        let chained = f.then_next(next);
        assert_eq!(chained.get().unwrap_err().message, "boom");
    }

    #[test]
    fn test_into_unit_discards_value_but_keeps_failure() {
        let unit_ok = Future::ready(123).into_unit();
        assert_eq!(unit_ok.get().unwrap(), ());

        let unit_err: Future<()> = Future::failed(TaskError::new("boom")).into_unit();
        assert!(unit_err.get().is_err());
    }

    #[test]
    fn test_spawn_blocking_awaiter_runs_on_pool_and_catches_panics() {
        let f = spawn_blocking_awaiter(|| 2 + 2);
        assert_eq!(f.get().unwrap(), 4);

        let f2: Future<i32> = spawn_blocking_awaiter(|| panic!("kaboom"));
        assert!(f2.get().is_err());
    }

    #[test]
    fn test_sleep_awaiter_takes_at_least_the_requested_duration() {
        let start = std::time::Instant::now();
        sleep_awaiter(std::time::Duration::from_millis(15)).get().unwrap();
        assert!(start.elapsed() >= std::time::Duration::from_millis(15));
    }

    #[test]
    fn test_run_tasks_collects_results_in_submission_order() {
        let results = run_tasks(0..5, |i: i32| i * i);
        let values: Vec<i32> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(values, vec![0, 1, 4, 9, 16]);
    }

    #[test]
    fn test_await_interop() {
        let (promise, future) = Promise::new();
        thread::spawn(move || {
            thread::sleep(std::time::Duration::from_millis(10));
            promise.set_value(99);
        });
        let result = block_on(future);
        assert_eq!(result.unwrap(), 99);
    }

    /// A minimal single-threaded block_on, since the crate carries no
    /// async runtime dependency — it only needs to prove `Future` is a
    /// valid `std::future::Future`, not exercise a production executor.
    fn block_on<F: StdFuture>(future: F) -> F::Output {
        let waker = Waker::noop();
        let mut cx = Context::from_waker(waker);
        let mut future = Box::pin(future);
        loop {
            match future.as_mut().poll(&mut cx) {
                Poll::Ready(v) => return v,
                Poll::Pending => thread::sleep(std::time::Duration::from_millis(1)),
            }
        }
    }
}
