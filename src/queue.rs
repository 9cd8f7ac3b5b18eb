//! A bounded-notify concurrent FIFO queue: [`ConcurrentQueue`].
//!
//! Grounded on `original_source/src/rpp/concurrent_queue.h`. Unlike a
//! lock-free ring buffer, this queue trades a small amount of throughput
//! for simplicity and a precise wait/notify contract: every push can wake
//! exactly the waiters it unblocks, and `clear()` is observable by anyone
//! currently blocked in `wait_pop`.

use std::collections::VecDeque;

use crate::condvar::{PrecisionCondvar, WaitResult};
use crate::mutex::{Mutex, MutexGuard};

struct Inner<T> {
    items: VecDeque<T>,
    cleared: bool,
}

/// Holds a [`ConcurrentQueue`] locked between
/// [`ConcurrentQueue::pop_atomic_start`] and
/// [`ConcurrentQueue::pop_atomic_end`].
pub struct PopGuard<'a, T> {
    guard: Option<MutexGuard<'a, Inner<T>>>,
}

/// A bounded-notify concurrent FIFO queue.
///
/// # Examples
///
/// ```
/// use parking_lot_core_async::queue::ConcurrentQueue;
/// use std::sync::Arc;
/// use std::thread;
///
/// let q = Arc::new(ConcurrentQueue::new());
/// let q2 = Arc::clone(&q);
/// thread::spawn(move || q2.push(42));
/// assert_eq!(q.wait_pop(), Some(42));
/// ```
pub struct ConcurrentQueue<T> {
    inner: Mutex<Inner<T>>,
    cv: PrecisionCondvar,
}

/// Capacity above which an emptied queue's backing storage is shrunk back
/// down, matching the original's shrink-when-empty-and-oversized rule.
const SHRINK_ABOVE_CAPACITY: usize = 8192;
/// The reclaimed capacity target after a shrink.
const SHRINK_TO_CAPACITY: usize = 256;

impl<T> ConcurrentQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                cleared: false,
            }),
            cv: PrecisionCondvar::new(),
        }
    }

    /// Reserves capacity for at least `additional` more items.
    pub fn reserve(&self, additional: usize) {
        self.inner.lock().items.reserve(additional);
    }

    /// Current number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// `true` if the queue holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().items.is_empty()
    }

    /// Pushes an item and wakes one waiter.
    pub fn push(&self, item: T) {
        let mut guard = self.inner.lock();
        guard.cleared = false;
        guard.items.push_back(item);
        drop(guard);
        self.cv.notify_one(&self.inner);
    }

    /// Pushes an item without waking anyone. Useful for batch producers
    /// that call [`ConcurrentQueue::notify`] once after several pushes.
    pub fn push_no_notify(&self, item: T) {
        let mut guard = self.inner.lock();
        guard.cleared = false;
        guard.items.push_back(item);
    }

    /// Pops an item immediately, or returns `None` if empty. Never blocks.
    pub fn try_pop(&self) -> Option<T> {
        let mut guard = self.inner.lock();
        let item = guard.items.pop_front();
        self.maybe_shrink(&mut guard);
        item
    }

    /// Drains and returns every currently-queued item. Never blocks.
    pub fn try_pop_all(&self) -> Vec<T> {
        let mut guard = self.inner.lock();
        let drained: Vec<T> = guard.items.drain(..).collect();
        self.maybe_shrink(&mut guard);
        drained
    }

    /// Pops the front item, if any, but keeps the queue locked until the
    /// returned [`PopGuard`] is released by [`ConcurrentQueue::pop_atomic_end`]
    /// — so the caller can finish processing the popped value before any
    /// other thread observes the queue again. Ports
    /// `concurrent_queue::pop_atomic_start`.
    pub fn pop_atomic_start(&self) -> (Option<T>, PopGuard<'_, T>) {
        let mut guard = self.inner.lock();
        let item = guard.items.pop_front();
        (item, PopGuard { guard: Some(guard) })
    }

    /// Releases the lock taken by [`ConcurrentQueue::pop_atomic_start`].
    /// Ports `concurrent_queue::pop_atomic_end`.
    pub fn pop_atomic_end(&self, mut token: PopGuard<'_, T>) {
        if let Some(mut guard) = token.guard.take() {
            self.maybe_shrink(&mut guard);
        }
    }

    /// Pops the front item, if any, and runs `f` with it while the queue
    /// stays locked, releasing automatically once `f` returns. The
    /// single-call counterpart of
    /// [`pop_atomic_start`](Self::pop_atomic_start)/[`pop_atomic_end`](Self::pop_atomic_end).
    /// Ports `concurrent_queue::pop_atomic`.
    pub fn pop_atomic<F, R>(&self, f: F) -> R
    where
        F: FnOnce(Option<T>) -> R,
    {
        let mut guard = self.inner.lock();
        let item = guard.items.pop_front();
        let result = f(item);
        self.maybe_shrink(&mut guard);
        result
    }

    /// Blocks until an item is available, then pops and returns it.
    /// Returns `None` only if the queue was concurrently [`clear`](Self::clear)ed
    /// while waiting — the original's `Cleared` signal, not a real item.
    pub fn wait_pop(&self) -> Option<T> {
        let mut guard = self.inner.lock();
        loop {
            if let Some(item) = guard.items.pop_front() {
                self.maybe_shrink(&mut guard);
                return Some(item);
            }
            if guard.cleared {
                guard.cleared = false;
                return None;
            }
            self.cv.wait_while(&mut guard, |inner| inner.items.is_empty() && !inner.cleared);
        }
    }

    /// Like [`ConcurrentQueue::wait_pop`], but gives up after `timeout`,
    /// returning `None` on timeout as well as on clear (the original
    /// collapses both into "no item" for this variant; callers needing to
    /// distinguish should use [`ConcurrentQueue::wait_pop_interval`]).
    pub fn wait_pop_timeout(&self, timeout: std::time::Duration) -> Option<T> {
        self.wait_pop_until(std::time::Instant::now() + timeout)
    }

    /// Like [`ConcurrentQueue::wait_pop_timeout`], but takes an absolute
    /// deadline instead of a relative duration. Ports
    /// `concurrent_queue::wait_pop_until`.
    pub fn wait_pop_until(&self, deadline: std::time::Instant) -> Option<T> {
        let mut guard = self.inner.lock();
        loop {
            if let Some(item) = guard.items.pop_front() {
                self.maybe_shrink(&mut guard);
                return Some(item);
            }
            if guard.cleared {
                guard.cleared = false;
                return None;
            }
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }
            if self.cv.wait_for(&mut guard, remaining) == WaitResult::TimedOut {
                return None;
            }
        }
    }

    /// Waits up to `timeout` total, polling `cancel` every `interval` so a
    /// caller can bail out of a long wait early (e.g. on shutdown). Ports
    /// `rpp::concurrent_queue::wait_pop_interval`.
    pub fn wait_pop_interval<F>(
        &self,
        timeout: std::time::Duration,
        interval: std::time::Duration,
        mut cancel: F,
    ) -> Option<T>
    where
        F: FnMut() -> bool,
    {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            if cancel() {
                return None;
            }
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let slice = remaining.min(interval);
            if let Some(item) = self.wait_pop_timeout(slice) {
                return Some(item);
            }
        }
    }

    /// Removes all queued items and marks the queue as cleared, waking
    /// every waiter (they observe the clear and return `None`).
    pub fn clear(&self) {
        let mut guard = self.inner.lock();
        guard.items.clear();
        guard.cleared = true;
        self.maybe_shrink(&mut guard);
        drop(guard);
        self.cv.notify_all(&self.inner);
    }

    /// Wakes every waiter, running `f` while the queue's internal lock is
    /// held. This is the prescribed way to flip an external cancellation
    /// flag that a [`ConcurrentQueue::wait_pop_interval`] caller polls:
    /// running the flip under the same lock a waiter's predicate check
    /// takes closes the lost-wakeup race where the flag is flipped and
    /// the notify fires between a waiter's check and its going to sleep.
    /// Ports `concurrent_queue::notify(changeWaitFlagsFn)`.
    pub fn notify<F: FnOnce()>(&self, f: F) {
        let guard = self.inner.lock();
        f();
        drop(guard);
        self.cv.notify_all(&self.inner);
    }

    fn maybe_shrink(&self, guard: &mut Inner<T>) {
        if guard.items.is_empty() && guard.items.capacity() > SHRINK_ABOVE_CAPACITY {
            guard.items.shrink_to(SHRINK_TO_CAPACITY);
        }
    }
}

impl<T> Default for ConcurrentQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
