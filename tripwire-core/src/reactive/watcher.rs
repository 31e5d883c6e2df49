//! Watcher Implementation
//!
//! A Watcher wraps a function and discovers, on every execution, which
//! triggers that function depends on. When any of them changes, the
//! watcher's responder is invoked.
//!
//! # How Watchers Work
//!
//! 1. `execute` drops every edge left over from the previous execution.
//!
//! 2. The watcher pushes itself onto the manager's active stack and calls
//!    its function. Each trigger read along the way subscribes the watcher.
//!
//! 3. The stack is popped on every exit path, including a panic unwinding
//!    out of the function.
//!
//! 4. When a tracked trigger changes, the manager calls `respond`, which
//!    invokes the responder. Re-executing (or not) is the responder's call.
//!
//! # Disposal
//!
//! `dispose` detaches all edges, takes the watcher out of any pending
//! batch and drops its function and responder. Disposal is idempotent and
//! may happen while the watcher is executing. Dropping the last handle of
//! an undisposed watcher releases its bookkeeping the same way.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::context::WatcherFrame;
use super::id::WatcherId;
use super::manager::{Manager, Respond};
use crate::error::{ReactiveError, Result};

type WatchedFn<A, R> = Rc<dyn Fn(A) -> R>;
type ResponderFn = Rc<dyn Fn()>;

struct WatcherInner<A, R> {
    id: WatcherId,
    func: RefCell<Option<WatchedFn<A, R>>>,
    responder: RefCell<Option<ResponderFn>>,
    disposed: Cell<bool>,
    run_count: Cell<usize>,
}

impl<A, R> Respond for WatcherInner<A, R> {
    fn respond(&self) {
        if self.disposed.get() {
            return;
        }
        let responder = self.responder.borrow().clone();
        if let Some(responder) = responder {
            responder();
        }
    }
}

impl<A, R> Drop for WatcherInner<A, R> {
    fn drop(&mut self) {
        if !self.disposed.get() {
            Manager::release(self.id);
        }
    }
}

/// A function wrapper that tracks the triggers it reads.
///
/// `A` is the argument passed to each execution and `R` its result; both
/// default to `()`.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use tripwire_core::{Trigger, Watcher};
///
/// let count = Trigger::new(10);
/// let changes = Rc::new(Cell::new(0));
///
/// let source = count.clone();
/// let seen = changes.clone();
/// let watcher = Watcher::new(move |()| source.get() + 1, move || seen.set(seen.get() + 1));
///
/// assert_eq!(watcher.run().unwrap(), 11);
/// count.set(20);
/// assert_eq!(changes.get(), 1);
/// ```
pub struct Watcher<A = (), R = ()> {
    inner: Rc<WatcherInner<A, R>>,
}

impl<A: 'static, R: 'static> Watcher<A, R> {
    /// Wrap `func`, to be re-run at the discretion of `responder`.
    ///
    /// Nothing runs until the first [`execute`](Self::execute).
    pub fn new<F, N>(func: F, responder: N) -> Self
    where
        F: Fn(A) -> R + 'static,
        N: Fn() + 'static,
    {
        let inner = Rc::new(WatcherInner {
            id: WatcherId::next(),
            func: RefCell::new(Some(Rc::new(func) as WatchedFn<A, R>)),
            responder: RefCell::new(Some(Rc::new(responder) as ResponderFn)),
            disposed: Cell::new(false),
            run_count: Cell::new(0),
        });
        let weak: Weak<dyn Respond> = Rc::downgrade(&inner) as Weak<dyn Respond>;
        Manager::register(inner.id, weak);
        Self { inner }
    }
}

impl<A, R> Watcher<A, R> {
    /// Get the watcher's unique ID.
    pub fn id(&self) -> WatcherId {
        self.inner.id
    }

    /// Execute the wrapped function, rebuilding the dependency set.
    ///
    /// Fails if the watcher has been disposed. A panic in the function
    /// propagates after the active stack has been restored; the edges
    /// recorded up to that point are kept.
    pub fn execute(&self, args: A) -> Result<R> {
        if self.inner.disposed.get() {
            return Err(ReactiveError::disposed("watcher"));
        }
        let func = self
            .inner
            .func
            .borrow()
            .clone()
            .ok_or_else(|| ReactiveError::disposed("watcher"))?;

        Manager::clear_watcher_edges(self.inner.id);
        let _frame = WatcherFrame::enter(self.inner.id);
        let output = func(args);
        self.inner.run_count.set(self.inner.run_count.get() + 1);
        Ok(output)
    }

    /// Invoke the responder. No-op once disposed.
    pub fn respond(&self) {
        self.inner.respond();
    }

    /// Dispose of the watcher. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        Manager::release(self.inner.id);
        let func = self.inner.func.borrow_mut().take();
        let responder = self.inner.responder.borrow_mut().take();
        drop((func, responder));
    }

    /// Check if the watcher has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Number of completed executions.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.get()
    }

    /// Number of triggers read by the latest execution.
    pub fn tracked_count(&self) -> usize {
        Manager::tracked_count(self.inner.id)
    }
}

impl<R> Watcher<(), R> {
    /// Execute a watcher that takes no arguments.
    pub fn run(&self) -> Result<R> {
        self.execute(())
    }
}

impl<A, R> Clone for Watcher<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A, R> std::fmt::Debug for Watcher<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("tracked_count", &self.tracked_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
