//! Type-erased callable wrappers: `Delegate` and `MulticastDelegate`.
//!
//! A [`Delegate`] stores any `Fn`-like callable without requiring the
//! caller to know its concrete type, at the cost of one allocation for
//! closures (free functions and bound methods are stored inline).
//!
//! # Examples
//!
//! ```
//! use parking_lot_core_async::delegate::Delegate;
//!
//! let d = Delegate::new(|x: i32| x + 1);
//! assert_eq!(d.call(41), 42);
//! ```

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// The callable payload a [`Delegate`] can hold.
enum Target<Args, Ret> {
    /// No callable bound yet. Calling a `Delegate` in this state panics.
    Empty,
    /// A plain function pointer (no captured state).
    Free(fn(Args) -> Ret),
    /// A boxed closure (captured state, one allocation).
    Boxed(Arc<dyn Fn(Args) -> Ret + Send + Sync>),
}

/// A single type-erased callable: a free function or a boxed closure.
///
/// Equality compares function-pointer identity for [`Target::Free`] and
/// `Arc` pointer identity for [`Target::Boxed`] (closure identity is
/// best-effort, matching `delegate.h`'s functor comparison: two delegates
/// built from *separately* boxed closures are never equal even if the
/// closures behave identically).
pub struct Delegate<Args, Ret> {
    target: Target<Args, Ret>,
}

impl<Args, Ret> Delegate<Args, Ret> {
    /// Constructs an empty delegate bound to no callable. Ports
    /// `delegate`'s default constructor; matches the "construct(empty)"
    /// operation alongside the `bool` emptiness test below.
    #[must_use]
    pub const fn empty() -> Self {
        Self { target: Target::Empty }
    }

    /// Wraps a free function pointer. No allocation.
    #[must_use]
    pub fn from_fn(f: fn(Args) -> Ret) -> Self {
        Self {
            target: Target::Free(f),
        }
    }

    /// Wraps a closure (or any `Fn`), boxing it behind an `Arc`.
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Args) -> Ret + Send + Sync + 'static,
    {
        Self {
            target: Target::Boxed(Arc::new(f)),
        }
    }

    /// The explicit `bool` test for emptiness: `true` if no callable is
    /// bound.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.target, Target::Empty)
    }

    /// Invokes the wrapped callable.
    ///
    /// # Panics
    ///
    /// Panics if the delegate is [`Delegate::empty`] — calling an unbound
    /// delegate is a programming error, not a recoverable one (spec.md
    /// §7.6's "assertion failures" class).
    pub fn call(&self, args: Args) -> Ret {
        match &self.target {
            Target::Empty => panic!("called an empty Delegate"),
            Target::Free(f) => f(args),
            Target::Boxed(f) => f(args),
        }
    }
}

impl<Args, Ret> Clone for Delegate<Args, Ret> {
    fn clone(&self) -> Self {
        let target = match &self.target {
            Target::Empty => Target::Empty,
            Target::Free(f) => Target::Free(*f),
            Target::Boxed(f) => Target::Boxed(Arc::clone(f)),
        };
        Self { target }
    }
}

impl<Args, Ret> fmt::Debug for Delegate<Args, Ret> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Target::Empty => write!(f, "Delegate::Empty"),
            Target::Free(ptr) => write!(f, "Delegate::Free({:p})", *ptr as *const ()),
            Target::Boxed(rc) => write!(f, "Delegate::Boxed({:p})", Arc::as_ptr(rc)),
        }
    }
}

impl<Args, Ret> PartialEq for Delegate<Args, Ret> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.target, &other.target) {
            (Target::Empty, Target::Empty) => true,
            (Target::Free(a), Target::Free(b)) => std::ptr::eq(*a as *const (), *b as *const ()),
            (Target::Boxed(a), Target::Boxed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<Args, Ret> Default for Delegate<Args, Ret> {
    fn default() -> Self {
        Self::empty()
    }
}

/// An ordered collection of [`Delegate`]s, all invoked on [`call`](Self::call).
///
/// Matches `delegate.h`'s multicast delegate: `add` appends, `remove`
/// drops the first delegate comparing equal, `clear` empties the list.
/// Invocation order is insertion order; a panicking subscriber aborts the
/// remaining calls (propagated like any other Rust panic — `rpp`'s own
/// multicast delegate makes the same trade-off, calling subscribers
/// in turn with no isolation between them).
pub struct MulticastDelegate<Args, Ret = ()> {
    subscribers: Vec<Delegate<Args, Ret>>,
}

impl<Args, Ret> MulticastDelegate<Args, Ret> {
    /// Creates an empty multicast delegate.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Number of currently-registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Returns `true` if no subscribers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Appends a subscriber.
    pub fn add(&mut self, delegate: Delegate<Args, Ret>) {
        self.subscribers.push(delegate);
    }

    /// Removes the first subscriber equal to `delegate`, returning whether
    /// one was found.
    pub fn remove(&mut self, delegate: &Delegate<Args, Ret>) -> bool {
        if let Some(pos) = self.subscribers.iter().position(|d| d == delegate) {
            self.subscribers.remove(pos);
            true
        } else {
            false
        }
    }

    /// Removes all subscribers.
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}

impl<Args: Clone, Ret> MulticastDelegate<Args, Ret> {
    /// Invokes every subscriber in insertion order with a clone of `args`,
    /// returning the results in the same order.
    pub fn call(&self, args: Args) -> Vec<Ret> {
        self.subscribers
            .iter()
            .map(|d| d.call(args.clone()))
            .collect()
    }
}

impl<Args, Ret> Default for MulticastDelegate<Args, Ret> {
    fn default() -> Self {
        Self::new()
    }
}

/// A single-threaded variant of [`Delegate`] for callables that are not
/// `Send`/`Sync` (e.g. capture an `Rc<RefCell<_>>`). Kept separate so the
/// common, thread-safe [`Delegate`] never pays for `Rc`'s lack of atomics.
pub struct LocalDelegate<Args, Ret> {
    target: LocalTarget<Args, Ret>,
}

enum LocalTarget<Args, Ret> {
    Empty,
    Free(fn(Args) -> Ret),
    Boxed(Rc<dyn Fn(Args) -> Ret>),
}

impl<Args, Ret> LocalDelegate<Args, Ret> {
    /// Constructs an empty delegate bound to no callable.
    #[must_use]
    pub const fn empty() -> Self {
        Self { target: LocalTarget::Empty }
    }

    /// Wraps a free function pointer.
    #[must_use]
    pub fn from_fn(f: fn(Args) -> Ret) -> Self {
        Self {
            target: LocalTarget::Free(f),
        }
    }

    /// Wraps a non-`Send` closure.
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Args) -> Ret + 'static,
    {
        Self {
            target: LocalTarget::Boxed(Rc::new(f)),
        }
    }

    /// The explicit `bool` test for emptiness.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.target, LocalTarget::Empty)
    }

    /// Invokes the wrapped callable.
    ///
    /// # Panics
    ///
    /// Panics if the delegate is [`LocalDelegate::empty`].
    pub fn call(&self, args: Args) -> Ret {
        match &self.target {
            LocalTarget::Empty => panic!("called an empty LocalDelegate"),
            LocalTarget::Free(f) => f(args),
            LocalTarget::Boxed(f) => f(args),
        }
    }
}

impl<Args, Ret> Clone for LocalDelegate<Args, Ret> {
    fn clone(&self) -> Self {
        let target = match &self.target {
            LocalTarget::Empty => LocalTarget::Empty,
            LocalTarget::Free(f) => LocalTarget::Free(*f),
            LocalTarget::Boxed(f) => LocalTarget::Boxed(Rc::clone(f)),
        };
        Self { target }
    }
}

impl<Args, Ret> Default for LocalDelegate<Args, Ret> {
    fn default() -> Self {
        Self::empty()
    }
}
