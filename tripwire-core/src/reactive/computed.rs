//! Computed Trigger Implementation
//!
//! A computed trigger is a trigger whose value is derived from other
//! triggers by a compute function. It caches the result and is readable
//! like any trigger, so watchers (and other computed triggers) can depend
//! on it.
//!
//! # When It Recomputes
//!
//! 1. On first `get`, an internal watcher is created around the compute
//!    function and executed; the result is committed and cached.
//!
//! 2. When a dependency changes and the computed trigger has subscribers,
//!    it recomputes right away, so readers always see a fresh value and a
//!    change propagates to them if the result differs.
//!
//! 3. When a dependency changes and nobody subscribes, it only marks itself
//!    stale. The next `get` recomputes, once, however many changes happened
//!    in between.
//!
//! # Failure
//!
//! A panicking compute function leaves the last committed value in place
//! and the computed trigger stale, so the next `get` tries again.

use std::cell::{Cell, OnceCell, RefCell};
use std::fmt::Debug;
use std::rc::Rc;

use tracing::debug;

use super::id::TriggerId;
use super::manager::Manager;
use super::watcher::Watcher;
use crate::error::{ReactiveError, Result};

type ComputeFn<T> = Rc<dyn Fn() -> T>;

const KIND: &str = "computed trigger";

struct ComputedInner<T> {
    id: TriggerId,
    value: RefCell<Option<T>>,
    compute: RefCell<Option<ComputeFn<T>>>,
    watcher: OnceCell<Watcher<(), T>>,
    stale: Cell<bool>,
    disposed: Cell<bool>,
}

impl<T: PartialEq> ComputedInner<T> {
    /// Store a freshly computed value through the trigger write path.
    fn commit(&self, value: T) {
        self.stale.set(false);
        if self.value.borrow().as_ref() == Some(&value) {
            return;
        }
        let previous = self.value.replace(Some(value));
        drop(previous);

        if Manager::has_subscribers(self.id) {
            Manager::notify_trigger_changed(self.id);
        }
    }

    /// Responder of the internal watcher.
    fn dependency_changed(&self) {
        if self.disposed.get() {
            return;
        }
        self.stale.set(true);
        if !Manager::has_subscribers(self.id) {
            return;
        }
        let Some(watcher) = self.watcher.get().cloned() else {
            return;
        };
        match watcher.run() {
            Ok(value) => self.commit(value),
            Err(err) => debug!(trigger = ?self.id, %err, "eager recompute skipped"),
        }
    }
}

impl<T> Drop for ComputedInner<T> {
    fn drop(&mut self) {
        Manager::forget_trigger(self.id);
    }
}

/// A memoized value derived from other triggers.
///
/// Cloning a `Computed` creates another handle to the same state.
///
/// # Example
///
/// ```
/// use tripwire_core::{Computed, Trigger};
///
/// let count = Trigger::new(2);
/// let source = count.clone();
/// let doubled = Computed::new(move || source.get() * 2);
///
/// assert_eq!(doubled.get().unwrap(), 4);
/// count.set(5);
/// assert_eq!(doubled.get().unwrap(), 10);
/// ```
pub struct Computed<T> {
    inner: Rc<ComputedInner<T>>,
}

impl<T: Clone + PartialEq + 'static> Computed<T> {
    /// Create a computed trigger. Nothing is computed until the first `get`.
    pub fn new(compute: impl Fn() -> T + 'static) -> Self {
        Self {
            inner: Rc::new(ComputedInner {
                id: TriggerId::next(),
                value: RefCell::new(None),
                compute: RefCell::new(Some(Rc::new(compute) as ComputeFn<T>)),
                watcher: OnceCell::new(),
                stale: Cell::new(true),
                disposed: Cell::new(false),
            }),
        }
    }

    /// The internal watcher, created on first use.
    fn watcher(&self) -> Result<Watcher<(), T>> {
        if let Some(watcher) = self.inner.watcher.get() {
            return Ok(watcher.clone());
        }
        let compute = self
            .inner
            .compute
            .borrow()
            .clone()
            .ok_or_else(|| ReactiveError::disposed(KIND))?;

        let weak = Rc::downgrade(&self.inner);
        let watcher = Watcher::new(
            move |()| compute(),
            move || {
                if let Some(inner) = weak.upgrade() {
                    inner.dependency_changed();
                }
            },
        );
        Manager::mark_derived(watcher.id());
        Ok(self.inner.watcher.get_or_init(|| watcher).clone())
    }

    /// Get the current value, recomputing first if stale.
    ///
    /// Reports a read like any trigger. Fails if the computed trigger was
    /// disposed while stale.
    pub fn get(&self) -> Result<T> {
        if self.inner.stale.get() {
            let value = self.watcher()?.run()?;
            self.inner.commit(value);
        }
        Manager::notify_trigger_read(self.inner.id);
        self.inner
            .value
            .borrow()
            .clone()
            .ok_or_else(|| ReactiveError::disposed(KIND))
    }
}

impl<T> Computed<T> {
    /// Get the computed trigger's unique ID.
    pub fn id(&self) -> TriggerId {
        self.inner.id
    }

    /// The last committed value, without recomputing or tracking.
    pub fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// True if the next `get` will recompute.
    pub fn is_stale(&self) -> bool {
        self.inner.stale.get()
    }

    /// Check if a value has ever been committed.
    pub fn has_value(&self) -> bool {
        self.inner.value.borrow().is_some()
    }

    /// Number of watchers subscribed to this computed trigger.
    pub fn subscriber_count(&self) -> usize {
        Manager::subscriber_count(self.inner.id)
    }

    /// Number of successful computations so far.
    pub fn compute_count(&self) -> usize {
        self.inner.watcher.get().map_or(0, Watcher::run_count)
    }

    /// Dispose of the internal watcher and drop the compute function.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        if let Some(watcher) = self.inner.watcher.get() {
            watcher.dispose();
        }
        let compute = self.inner.compute.borrow_mut().take();
        drop(compute);
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug> Debug for Computed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.inner.id)
            .field("stale", &self.is_stale())
            .field("has_value", &self.has_value())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Trigger;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn computes_on_first_access() {
        let computed = Computed::new(|| 42);

        assert!(!computed.has_value());
        assert!(computed.is_stale());
        assert_eq!(computed.compute_count(), 0);

        assert_eq!(computed.get().unwrap(), 42);
        assert_eq!(computed.compute_count(), 1);
        assert!(computed.has_value());
        assert!(!computed.is_stale());
    }

    #[test]
    fn caches_value_when_fresh() {
        let computed = Computed::new(|| 42);

        assert_eq!(computed.get().unwrap(), 42);
        assert_eq!(computed.get().unwrap(), 42);
        assert_eq!(computed.get().unwrap(), 42);
        assert_eq!(computed.compute_count(), 1);
    }

    #[test]
    fn unread_computed_stays_lazy() {
        let base = Trigger::new(1);
        let source = base.clone();
        let computed = Computed::new(move || source.get() * 10);
        assert_eq!(computed.get().unwrap(), 10);

        for value in 2..=6 {
            base.set(value);
        }
        assert!(computed.is_stale());
        assert_eq!(computed.compute_count(), 1);

        assert_eq!(computed.get().unwrap(), 60);
        assert_eq!(computed.compute_count(), 2);
    }

    #[test]
    fn subscribed_computed_recomputes_eagerly() {
        let base = Trigger::new(1);
        let source = base.clone();
        let computed = Computed::new(move || source.get() + 1);

        let reader = computed.clone();
        let watcher: Watcher<(), i32> = Watcher::new(move |()| reader.get().unwrap(), || {});
        assert_eq!(watcher.run().unwrap(), 2);
        assert_eq!(computed.subscriber_count(), 1);

        base.set(10);
        assert_eq!(computed.compute_count(), 2);
        assert!(!computed.is_stale());
        assert_eq!(computed.peek(), Some(11));
    }

    #[test]
    fn equal_result_does_not_notify() {
        let base = Trigger::new(3);
        let source = base.clone();
        let parity = Computed::new(move || source.get() % 2);

        let hits = Rc::new(std::cell::Cell::new(0));
        let (reader, counter) = (parity.clone(), hits.clone());
        let watcher: Watcher<(), i32> = Watcher::new(
            move |()| reader.get().unwrap(),
            move || counter.set(counter.get() + 1),
        );
        watcher.run().unwrap();

        // Still odd; the watcher only hears about it through `base` itself.
        let before = hits.get();
        base.set(5);
        assert_eq!(parity.compute_count(), 2);
        assert_eq!(hits.get(), before + 1);
    }

    #[test]
    fn failed_recompute_keeps_previous_value() {
        let base = Trigger::new(1);
        let source = base.clone();
        let checked = Computed::new(move || {
            let value = source.get();
            assert!(value >= 0, "negative input");
            value
        });
        assert_eq!(checked.get().unwrap(), 1);

        base.set(-1);
        let result = catch_unwind(AssertUnwindSafe(|| checked.get()));
        assert!(result.is_err());
        assert_eq!(checked.peek(), Some(1));
        assert!(checked.is_stale());
        assert_eq!(Manager::active_depth(), 0);

        base.set(7);
        assert_eq!(checked.get().unwrap(), 7);
    }

    #[test]
    fn computed_chain() {
        let base = Trigger::new(5);
        let source = base.clone();
        let doubled = Computed::new(move || source.get() * 2);
        let inner = doubled.clone();
        let plus_ten = Computed::new(move || inner.get().unwrap() + 10);

        assert_eq!(plus_ten.get().unwrap(), 20);

        base.set(10);
        assert_eq!(plus_ten.get().unwrap(), 30);
        assert_eq!(doubled.peek(), Some(20));
    }

    #[test]
    fn disposed_computed() {
        let base = Trigger::new(1);
        let source = base.clone();
        let computed = Computed::new(move || source.get());
        assert_eq!(computed.get().unwrap(), 1);

        computed.dispose();
        computed.dispose();
        assert!(computed.is_disposed());
        assert_eq!(base.subscriber_count(), 0);

        // Nothing marks it stale any more, so the cached value is served.
        base.set(2);
        assert_eq!(computed.get().unwrap(), 1);
    }

    #[test]
    fn disposed_before_first_read_fails() {
        let computed = Computed::new(|| 1);
        computed.dispose();
        assert!(computed.get().unwrap_err().is_disposed());
    }
}
