//! Trigger Implementation
//!
//! A Trigger is the fundamental reactive value holder. It holds a value and
//! takes part in the read/change protocol run by the [`Manager`].
//!
//! # How Triggers Work
//!
//! 1. Reading a trigger (`get`, `with`) reports a read to the manager, which
//!    subscribes every executing watcher to it.
//!
//! 2. Writing a trigger (`set`, `update`) stores the new value and, if the
//!    trigger has subscribers, reports a change. Equal values are ignored,
//!    and a trigger nobody subscribes to never dispatches.
//!
//! 3. Stored values are instrumented according to the trigger's [`Depth`],
//!    so tracked containers inside the value report reads and changes on
//!    the trigger's behalf. See [`crate::tracked`].
//!
//! # Memory Layout
//!
//! A trigger handle is a single `Rc`. Its subscribers live in the manager,
//! keyed by [`TriggerId`]; the trigger itself stores only its value.

use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

use super::id::TriggerId;
use super::manager::Manager;
use super::mutator::MutationScope;
use crate::tracked::{Depth, Instrument, Link};

struct TriggerInner<V> {
    id: TriggerId,
    depth: Depth,
    value: RefCell<V>,
}

impl<V> Drop for TriggerInner<V> {
    fn drop(&mut self) {
        Manager::forget_trigger(self.id);
    }
}

/// A reactive value holder.
///
/// Cloning a `Trigger` creates another handle to the same value.
///
/// # Example
///
/// ```
/// use tripwire_core::Trigger;
///
/// let count = Trigger::new(0);
/// count.set(5);
/// assert_eq!(count.get(), 5);
/// ```
pub struct Trigger<V> {
    inner: Rc<TriggerInner<V>>,
}

impl<V: Instrument> Trigger<V> {
    /// Create a trigger using the thread's configured default depth.
    pub fn new(value: V) -> Self {
        Self::with_depth(value, Manager::config().default_depth)
    }

    /// Create a trigger with an explicit propagation depth.
    pub fn with_depth(mut value: V, depth: Depth) -> Self {
        let id = TriggerId::next();
        value.instrument(Some(Link::new(id)), depth);
        Self {
            inner: Rc::new(TriggerInner {
                id,
                depth,
                value: RefCell::new(value),
            }),
        }
    }

    /// Create a trigger holding `V::default()`.
    pub fn empty(depth: Depth) -> Self
    where
        V: Default,
    {
        Self::with_depth(V::default(), depth)
    }

    /// Store a new value.
    ///
    /// No-op if `value` equals the current value. Otherwise the value is
    /// instrumented, stored, and subscribers (if any) are notified.
    pub fn set(&self, mut value: V)
    where
        V: PartialEq,
    {
        if *self.inner.value.borrow() == value {
            return;
        }
        value.instrument(Some(self.link()), self.inner.depth);
        let previous = self.inner.value.replace(value);
        // The old value may own containers; drop it before dispatching.
        drop(previous);

        if Manager::has_subscribers(self.inner.id) {
            Manager::notify_trigger_changed(self.inner.id);
        }
    }

    /// Store a value computed from the current one.
    pub fn update(&self, f: impl FnOnce(&V) -> V)
    where
        V: PartialEq,
    {
        let next = f(&self.inner.value.borrow());
        self.set(next);
    }
}

impl<V> Trigger<V> {
    /// Get the trigger's unique ID.
    pub fn id(&self) -> TriggerId {
        self.inner.id
    }

    /// The depth stored values are instrumented with.
    pub fn depth(&self) -> Depth {
        self.inner.depth
    }

    fn link(&self) -> Link {
        Link::new(self.inner.id)
    }

    /// Get a clone of the current value, reporting a read.
    ///
    /// Tracked containers clone into detached copies.
    pub fn get(&self) -> V
    where
        V: Clone,
    {
        Manager::notify_trigger_read(self.inner.id);
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value, reporting a read.
    pub fn with<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        Manager::notify_trigger_read(self.inner.id);
        f(&self.inner.value.borrow())
    }

    /// Get the current value without tracking dependencies.
    pub fn peek(&self) -> V
    where
        V: Clone,
    {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value without reporting a read at this level.
    ///
    /// Tracked containers inside the value still report their own reads.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Mutate the stored value in place.
    ///
    /// `f` runs inside a mutation scope, so every change reported by
    /// tracked containers is delivered once `f` has returned and the value
    /// is no longer borrowed. The trigger itself does not report a change;
    /// replacing a plain value goes through [`set`](Self::set).
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut V) -> R) -> R {
        let _scope = MutationScope::enter();
        let mut value = self.inner.value.borrow_mut();
        f(&mut value)
    }

    /// Number of watchers subscribed to this trigger.
    pub fn subscriber_count(&self) -> usize {
        Manager::subscriber_count(self.inner.id)
    }
}

impl<V> Clone for Trigger<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V: Debug> Debug for Trigger<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = f.debug_struct("Trigger");
        out.field("id", &self.inner.id)
            .field("depth", &self.inner.depth);
        match self.inner.value.try_borrow() {
            Ok(value) => out.field("value", &*value),
            Err(_) => out.field("value", &"<borrowed>"),
        };
        out.field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Watcher;
    use std::cell::Cell;

    fn counting_watcher(trigger: &Trigger<i32>) -> (Watcher<(), i32>, Rc<Cell<usize>>) {
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let source = trigger.clone();
        let watcher = Watcher::new(
            move |()| source.get(),
            move || counter.set(counter.get() + 1),
        );
        (watcher, hits)
    }

    #[test]
    fn trigger_get_and_set() {
        let trigger = Trigger::new(0);
        assert_eq!(trigger.get(), 0);

        trigger.set(42);
        assert_eq!(trigger.get(), 42);
    }

    #[test]
    fn trigger_update() {
        let trigger = Trigger::new(10);
        trigger.update(|v| v + 5);
        assert_eq!(trigger.get(), 15);
    }

    #[test]
    fn trigger_notifies_subscribers_synchronously() {
        let trigger = Trigger::new(1);
        let (watcher, hits) = counting_watcher(&trigger);
        assert_eq!(watcher.run().unwrap(), 1);
        assert_eq!(trigger.subscriber_count(), 1);

        trigger.set(2);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn equal_value_is_ignored() {
        let trigger = Trigger::new(7);
        let (watcher, hits) = counting_watcher(&trigger);
        watcher.run().unwrap();

        trigger.set(7);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn read_outside_watcher_subscribes_nobody() {
        let trigger = Trigger::new(0);
        let _ = trigger.get();
        assert_eq!(trigger.subscriber_count(), 0);
    }

    #[test]
    fn trigger_clone_shares_state() {
        let a = Trigger::new(0);
        let b = a.clone();

        a.set(42);
        assert_eq!(b.get(), 42);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn peek_does_not_subscribe() {
        let trigger = Trigger::new(3);
        let source = trigger.clone();
        let watcher: Watcher<(), i32> = Watcher::new(move |()| source.peek(), || {});
        watcher.run().unwrap();
        assert_eq!(trigger.subscriber_count(), 0);
    }

    #[test]
    fn empty_holds_default() {
        let trigger: Trigger<String> = Trigger::empty(Depth::Value);
        assert_eq!(trigger.get(), "");
    }

    #[test]
    fn new_uses_configured_depth() {
        Manager::configure(crate::config::ManagerConfig {
            default_depth: Depth::Deep,
            report_orphan_changes: false,
        });
        let trigger = Trigger::new(0u8);
        assert_eq!(trigger.depth(), Depth::Deep);
        Manager::configure(crate::config::ManagerConfig::default());
    }

    #[test]
    fn dropping_trigger_detaches_edges() {
        let watcher: Watcher = Watcher::new(|()| {}, || {});
        {
            let trigger = Trigger::new(0);
            let _frame = crate::reactive::WatcherFrame::enter(watcher.id());
            trigger.get();
            assert_eq!(watcher.tracked_count(), 1);
        }
        assert_eq!(watcher.tracked_count(), 0);
    }

    #[test]
    fn debug_shows_value() {
        let trigger = Trigger::new(5);
        let rendered = format!("{trigger:?}");
        assert!(rendered.contains("value: 5"));
    }
}
