//! [`CloseSync`]: a read-many/exclusive-one lifetime guard for orderly
//! shutdown of objects shared across threads.
//!
//! Grounded on `original_source/src/rpp/close_sync.h`. A long-lived object
//! (a connection, a pool, a device handle) embeds a `CloseSync` and has
//! every thread that touches it acquire a read-only lock first via
//! [`CloseSync::try_readonly_lock`]. Tearing the object down calls
//! [`CloseSync::lock_for_close`], which blocks until every outstanding
//! read lock has been released and prevents any new one from being
//! acquired.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{RwLock, RwLockReadGuard};

/// A guard proving the underlying object was alive at the moment it was
/// acquired. Holding it blocks [`CloseSync::lock_for_close`] from
/// completing.
pub struct ReadOnlyLock<'a> {
    _guard: RwLockReadGuard<'a, ()>,
}

/// A read-many/exclusive-one lifetime guard, grounded on `rpp::close_sync`.
///
/// # Examples
///
/// ```
/// use parking_lot_core_async::close_sync::CloseSync;
///
/// let sync = CloseSync::new();
/// {
///     let _guard = sync.try_readonly_lock().expect("object is alive");
///     // .. use the object ..
/// }
/// sync.lock_for_close(); // blocks until the guard above is dropped (it already was)
/// assert!(!sync.is_alive());
/// ```
pub struct CloseSync {
    lock: RwLock<()>,
    closing: AtomicBool,
}

impl CloseSync {
    /// Creates a `CloseSync` in the "alive" state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lock: RwLock::new(()),
            closing: AtomicBool::new(false),
        }
    }

    /// `true` if [`CloseSync::lock_for_close`] has not been called yet.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.closing.load(Ordering::Acquire)
    }

    /// `true` if [`CloseSync::lock_for_close`] has been called (whether or
    /// not it has finished blocking for outstanding readers).
    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    /// `is_closing() || !is_alive()` — kept for parity with the original's
    /// combined check used at call sites that only care "should I bail".
    #[must_use]
    pub fn is_dead_or_closing(&self) -> bool {
        self.is_closing()
    }

    /// Attempts to acquire a read-only (shared) lock, proving the object
    /// is alive for the guard's lifetime. Returns `None` immediately if
    /// closing has already begun — this never blocks waiting for a
    /// closer, it only refuses new readers once one has started.
    #[must_use]
    pub fn try_readonly_lock(&self) -> Option<ReadOnlyLock<'_>> {
        if self.is_closing() {
            return None;
        }
        let guard = self.lock.try_read()?;
        // Re-check after acquiring: a close could have started concurrently
        // with an uncontended read-lock acquisition.
        if self.is_closing() {
            return None;
        }
        Some(ReadOnlyLock { _guard: guard })
    }

    /// Marks the object as closing and blocks until every outstanding
    /// [`ReadOnlyLock`] has been released. Idempotent: a second call
    /// returns immediately.
    pub fn lock_for_close(&self) {
        if self.closing.swap(true, Ordering::AcqRel) {
            // Already closing (or closed) — original logs an error here on
            // double-close; we simply no-op, matching "acquire_exclusive_lock
            // is safe to call more than once" in spirit.
            let _exclusive = self.lock.write();
            return;
        }
        let _exclusive = self.lock.write();
    }
}

impl Default for CloseSync {
    fn default() -> Self {
        Self::new()
    }
}
