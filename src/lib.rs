//! # parking_lot_core_async
//!
//! A work-stealing-free concurrency core: a type-erased callable
//! ([`delegate`]), a single-task-slot thread pool ([`pool`]), a composable
//! future/promise with `async`/`await` interop ([`future`]), a
//! bounded-notify concurrent queue ([`queue`]), nanosecond-precision time
//! types ([`time`]), a sub-15ms-precision condition variable
//! ([`PrecisionCondvar`]), and a read-many/exclusive-one lifetime guard
//! ([`close_sync`]).
//!
//! Built on `parking_lot` for every lock primitive (no poisoning, fair
//! acquisition), `tracing` for structured diagnostics, and `thiserror`/
//! `anyhow` for its error taxonomy — the same ambient stack the
//! synchronization-primitives crate this was built from already used.
//!
//! ## Quick example
//!
//! ```
//! use parking_lot_core_async::pool::ThreadPool;
//!
//! let pool = ThreadPool::new();
//! let handle = pool.parallel_task(|| {
//!     // background work
//! });
//! handle.wait();
//! ```

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod mutex;
mod rwlock;
mod once;
mod condvar;

pub use mutex::{MappedMutexGuard, Mutex, MutexGuard};
pub use rwlock::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockUpgradableReadGuard,
    RwLockWriteGuard,
};
pub use once::{Once, OnceCell};
pub use condvar::{Condvar, PrecisionCondvar, WaitResult};

/// Type-erased callables: [`delegate::Delegate`] and [`delegate::MulticastDelegate`].
pub mod delegate;
/// Nanosecond-precision time types: `Duration`, `TimePoint`, `Timer`, `StopWatch`.
pub mod time;
/// A bounded-notify concurrent FIFO queue.
pub mod queue;
/// A read-many/exclusive-one lifetime guard.
pub mod close_sync;
/// A composable future/promise pair with `async`/`await` interop.
pub mod future;
/// A work-stealing-free thread pool with single-task-slot workers.
pub mod pool;
/// The crate's error taxonomy.
pub mod error;
/// Ambient utilities (structured logging setup).
pub mod util;
