//! Condition variable implementation.
//!
//! This module provides a condition variable type that can be used for thread coordination.

use crate::MutexGuard;
use parking_lot;

/// A condition variable.
///
/// Condition variables represent the ability to block a thread such that
/// it consumes no CPU time while waiting for an event to occur. Unlike
/// `std::sync::Condvar`, this type does not implement poisoning.
///
/// # Examples
///
/// ```
/// use parking_lot_core_async::{Mutex, Condvar};
/// use std::sync::Arc;
/// use std::thread;
///
/// let pair = Arc::new((Mutex::new(false), Condvar::new()));
/// let pair2 = Arc::clone(&pair);
///
/// // Spawn a thread that will signal the condition variable
/// thread::spawn(move || {
///     let (lock, cvar) = &*pair2;
///     let mut started = lock.lock();
///     *started = true;
///     // Signal that we're ready
///     cvar.notify_one();
/// });
///
/// // Wait for the thread to start up
/// let (lock, cvar) = &*pair;
/// let mut started = lock.lock();
/// while !*started {
///     cvar.wait(&mut started);
/// }
/// ```
#[derive(Debug, Default)]
pub struct Condvar {
    inner: parking_lot::Condvar,
}

impl Condvar {
    /// Creates a new condition variable.
    ///
    /// # Examples
    ///
    /// ```
    /// use parking_lot_core_async::Condvar;
    ///
    /// let cvar = Condvar::new();
    /// ```
    #[inline]
    pub const fn new() -> Self {
        Self {
            inner: parking_lot::Condvar::new(),
        }
    }

    /// Blocks the current thread until this condition variable receives a notification.
    ///
    /// This function will atomically unlock the mutex specified by `guard` and block the
    /// current thread. This means that any calls to `notify_one` or `notify_all` which
    /// happen logically after the mutex is unlocked are candidates to wake this thread up.
    /// When this function call returns, the lock specified will have been re-acquired.
    ///
    /// # Examples
    ///
    /// ```
    /// use parking_lot_core_async::{Mutex, Condvar};
    /// use std::sync::Arc;
    /// use std::thread;
    ///
    /// let pair = Arc::new((Mutex::new(false), Condvar::new()));
    /// let pair2 = Arc::clone(&pair);
    ///
    /// thread::spawn(move || {
    ///     let (lock, cvar) = &*pair2;
    ///     let mut ready = lock.lock();
    ///     *ready = true;
    ///     cvar.notify_one();
    /// });
    ///
    /// let (lock, cvar) = &*pair;
    /// let mut ready = lock.lock();
    /// while !*ready {
    ///     cvar.wait(&mut ready);
    /// }
    /// ```
    #[inline]
    pub fn wait<T>(&self, guard: &mut MutexGuard<'_, T>) {
        self.inner.wait(guard);
    }

    /// Blocks the current thread until this condition variable receives a notification
    /// and the provided condition is met.
    ///
    /// This function will atomically unlock the mutex and block the current thread until
    /// `condition` returns `false` after being called with the mutex guard.
    ///
    /// # Examples
    ///
    /// ```
    /// use parking_lot_core_async::{Mutex, Condvar};
    /// use std::sync::Arc;
    /// use std::thread;
    ///
    /// let pair = Arc::new((Mutex::new(0), Condvar::new()));
    /// let pair2 = Arc::clone(&pair);
    ///
    /// thread::spawn(move || {
    ///     let (lock, cvar) = &*pair2;
    ///     let mut count = lock.lock();
    ///     *count = 10;
    ///     cvar.notify_one();
    /// });
    ///
    /// let (lock, cvar) = &*pair;
    /// let mut count = lock.lock();
    /// cvar.wait_while(&mut count, |c| *c < 10);
    /// assert_eq!(*count, 10);
    /// ```
    #[inline]
    pub fn wait_while<T, F>(&self, guard: &mut MutexGuard<'_, T>, mut condition: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        self.inner.wait_while(guard, condition);
    }

    /// Wakes up one blocked thread on this condvar.
    ///
    /// If there is a blocked thread on this condition variable, then it will be woken up.
    /// Calls to `notify_one` are not buffered in any way.
    ///
    /// # Examples
    ///
    /// ```
    /// use parking_lot_core_async::{Mutex, Condvar};
    /// use std::sync::Arc;
    /// use std::thread;
    ///
    /// let pair = Arc::new((Mutex::new(false), Condvar::new()));
    /// let pair2 = Arc::clone(&pair);
    ///
    /// thread::spawn(move || {
    ///     let (lock, cvar) = &*pair2;
    ///     let mut started = lock.lock();
    ///     *started = true;
    ///     cvar.notify_one();
    /// });
    ///
    /// let (lock, cvar) = &*pair;
    /// let mut started = lock.lock();
    /// while !*started {
    ///     cvar.wait(&mut started);
    /// }
    /// ```
    #[inline]
    pub fn notify_one(&self) {
        self.inner.notify_one();
    }

    /// Wakes up all blocked threads on this condvar.
    ///
    /// This method will ensure that any current waiters on the condition variable are awoken.
    /// Calls to `notify_all` are not buffered in any way.
    ///
    /// # Examples
    ///
    /// ```
    /// use parking_lot_core_async::{Mutex, Condvar};
    /// use std::sync::Arc;
    /// use std::thread;
    ///
    /// let pair = Arc::new((Mutex::new(false), Condvar::new()));
    /// let mut handles = vec![];
    ///
    /// for _ in 0..3 {
    ///     let pair = Arc::clone(&pair);
    ///     let handle = thread::spawn(move || {
    ///         let (lock, cvar) = &*pair;
    ///         let mut started = lock.lock();
    ///         while !*started {
    ///             cvar.wait(&mut started);
    ///         }
    ///     });
    ///     handles.push(handle);
    /// }
    ///
    /// // Let threads start
    /// std::thread::sleep(std::time::Duration::from_millis(10));
    ///
    /// // Wake them all up
    /// {
    ///     let (lock, cvar) = &*pair;
    ///     let mut started = lock.lock();
    ///     *started = true;
    ///     cvar.notify_all();
    /// }
    ///
    /// // Wait for all threads
    /// for handle in handles {
    ///     handle.join().unwrap();
    /// }
    /// ```
    #[inline]
    pub fn notify_all(&self) {
        self.inner.notify_all();
    }
}

/// Outcome of a timed wait, analogous to `std::sync::WaitTimeoutResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitResult {
    /// The condition variable was notified before the timeout elapsed.
    Notified,
    /// The timeout elapsed without a notification.
    TimedOut,
}

/// A condition variable tuned for sub-15ms wait precision.
///
/// `parking_lot::Condvar::wait_for` already delegates to the OS's native
/// wait primitive, which on common platforms has tens-of-milliseconds
/// scheduling jitter for very short timeouts. `PrecisionCondvar` spins
/// (yielding the thread between polls) for timeouts at or below
/// [`PrecisionCondvar::SPIN_THRESHOLD`], and falls back to the native
/// condvar wait for anything longer — matching the strategy described in
/// `original_source/src/rpp/condition_variable.h`'s custom
/// `condition_variable` class.
///
/// `spec.md`'s precision-condvar contract mandates taking the paired
/// mutex before signalling, to avoid the lost-wakeup race described in
/// the original: "critical section lock is needed to avoid race
/// condition between notify() and wait() otherwise the notify() may
/// signal just before entering wait() and the signal is lost".
/// `PrecisionCondvar::notify_one`/`notify_all` therefore take the paired
/// [`Mutex`] and briefly acquire it themselves before signalling, rather
/// than trusting the caller to have already locked and dropped it.
#[derive(Debug, Default)]
pub struct PrecisionCondvar {
    inner: parking_lot::Condvar,
}

impl PrecisionCondvar {
    /// Timeouts at or below this threshold use a spin-wait instead of the
    /// native condvar, to achieve sub-millisecond wake precision.
    pub const SPIN_THRESHOLD: std::time::Duration = std::time::Duration::from_millis(2);

    /// Creates a new precision condition variable.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: parking_lot::Condvar::new(),
        }
    }

    /// Waits indefinitely until notified. Prefer [`PrecisionCondvar::wait_for`]
    /// when a bound on wait time is available.
    pub fn wait<T>(&self, guard: &mut MutexGuard<'_, T>) {
        self.inner.wait(guard);
    }

    /// Waits indefinitely while `condition(&mut *guard)` holds.
    pub fn wait_while<T, F>(&self, guard: &mut MutexGuard<'_, T>, mut condition: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        while condition(&mut *guard) {
            self.wait(guard);
        }
    }

    /// Waits until notified or `timeout` elapses, returning which
    /// happened. Spins for short timeouts, blocks on the native condvar
    /// otherwise.
    pub fn wait_for<T>(&self, guard: &mut MutexGuard<'_, T>, timeout: std::time::Duration) -> WaitResult {
        if timeout <= Self::SPIN_THRESHOLD {
            self.spin_wait(guard, timeout)
        } else {
            let result = self.inner.wait_for(guard, timeout);
            if result.timed_out() {
                WaitResult::TimedOut
            } else {
                WaitResult::Notified
            }
        }
    }

    /// Waits until `condition(&*guard)` is true or `timeout` elapses
    /// overall (not reset on each spurious wake).
    pub fn wait_while_for<T, F>(
        &self,
        guard: &mut MutexGuard<'_, T>,
        timeout: std::time::Duration,
        mut condition: F,
    ) -> WaitResult
    where
        F: FnMut(&mut T) -> bool,
    {
        let deadline = std::time::Instant::now() + timeout;
        while condition(&mut *guard) {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return WaitResult::TimedOut;
            }
            if self.wait_for(guard, remaining) == WaitResult::TimedOut {
                return WaitResult::TimedOut;
            }
        }
        WaitResult::Notified
    }

    /// A short polling wait used below [`PrecisionCondvar::SPIN_THRESHOLD`]:
    /// repeatedly releases the lock for a 0-duration native wait (to yield
    /// the thread fairly) and re-checks elapsed time, rather than trusting
    /// the OS scheduler's coarse timer granularity.
    fn spin_wait<T>(&self, guard: &mut MutexGuard<'_, T>, timeout: std::time::Duration) -> WaitResult {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return WaitResult::TimedOut;
            }
            let result = self.inner.wait_for(guard, remaining.min(std::time::Duration::from_micros(200)));
            if !result.timed_out() {
                return WaitResult::Notified;
            }
            std::thread::yield_now();
        }
    }

    /// Notifies one waiter, briefly taking `mutex` first to close the
    /// lost-wakeup race described above.
    #[inline]
    pub fn notify_one<T>(&self, mutex: &crate::mutex::Mutex<T>) {
        drop(mutex.lock());
        self.inner.notify_one();
    }

    /// Notifies all waiters, briefly taking `mutex` first.
    #[inline]
    pub fn notify_all<T>(&self, mutex: &crate::mutex::Mutex<T>) {
        drop(mutex.lock());
        self.inner.notify_all();
    }
}
