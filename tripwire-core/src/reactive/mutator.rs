//! Mutation Scopes and Mutators
//!
//! A mutation scope defers change notifications: while at least one scope
//! is open, changed triggers only mark their subscribers as pending. When
//! the outermost scope closes, each pending watcher responds exactly once,
//! however many of its dependencies changed.
//!
//! [`MutationScope`] is the RAII form, [`mutation_scope`] the closure form,
//! and a [`Mutator`] is a reusable function whose every call is one scope.
//! In all three the scope is closed even if the body panics.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::error;

use super::manager::Manager;
use crate::error::{ReactiveError, Result};

/// Guard that holds a mutation scope open while alive.
#[must_use = "the scope closes as soon as the guard is dropped"]
pub struct MutationScope {
    _private: (),
}

impl MutationScope {
    /// Open a scope; the outermost drop drains deferred watchers.
    pub fn enter() -> Self {
        Manager::enter_mutation_scope();
        Self { _private: () }
    }
}

impl Drop for MutationScope {
    fn drop(&mut self) {
        // Only reachable if someone closed this scope behind the guard's back.
        if let Err(err) = Manager::exit_mutation_scope() {
            error!(%err, "mutation scope guard found the scope already closed");
        }
    }
}

/// Run `f` inside one mutation scope.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use tripwire_core::{mutation_scope, Trigger, Watcher};
///
/// let a = Trigger::new(1);
/// let b = Trigger::new(2);
/// let runs = Rc::new(Cell::new(0));
///
/// let (x, y, seen) = (a.clone(), b.clone(), runs.clone());
/// let watcher = Watcher::new(move |()| x.get() + y.get(), move || seen.set(seen.get() + 1));
/// watcher.run().unwrap();
///
/// mutation_scope(|| {
///     a.set(10);
///     b.set(20);
/// });
/// assert_eq!(runs.get(), 1);
/// ```
pub fn mutation_scope<R>(f: impl FnOnce() -> R) -> R {
    let _scope = MutationScope::enter();
    f()
}

type MutatorFn<A, R> = Rc<dyn Fn(A) -> R>;

/// A function whose every invocation runs as a single mutation scope.
pub struct Mutator<A = (), R = ()> {
    func: Rc<RefCell<Option<MutatorFn<A, R>>>>,
}

impl<A: 'static, R: 'static> Mutator<A, R> {
    pub fn new(func: impl Fn(A) -> R + 'static) -> Self {
        Self {
            func: Rc::new(RefCell::new(Some(Rc::new(func) as MutatorFn<A, R>))),
        }
    }
}

impl<A, R> Mutator<A, R> {
    /// Invoke the wrapped function inside a mutation scope.
    ///
    /// Fails if the mutator has been disposed.
    pub fn call(&self, args: A) -> Result<R> {
        let func = self
            .func
            .borrow()
            .clone()
            .ok_or_else(|| ReactiveError::disposed("mutator"))?;
        let _scope = MutationScope::enter();
        Ok(func(args))
    }

    /// Drop the wrapped function; later calls fail. Idempotent.
    pub fn dispose(&self) {
        let func = self.func.borrow_mut().take();
        drop(func);
    }

    pub fn is_disposed(&self) -> bool {
        self.func.borrow().is_none()
    }
}

impl<R> Mutator<(), R> {
    pub fn run(&self) -> Result<R> {
        self.call(())
    }
}

impl<A, R> Clone for Mutator<A, R> {
    fn clone(&self) -> Self {
        Self {
            func: Rc::clone(&self.func),
        }
    }
}

impl<A, R> std::fmt::Debug for Mutator<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutator")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
