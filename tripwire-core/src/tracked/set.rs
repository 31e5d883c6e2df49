//! Tracked set.

use std::fmt;
use std::hash::Hash;

use indexmap::{Equivalent, IndexSet};

use super::{effective_link, Depth, Instrument, Link};

/// An insertion-ordered set whose membership queries and updates report to
/// the owning trigger.
///
/// Elements cannot be mutated in place, so they are stored as-is and never
/// instrumented.
pub struct TrackedSet<T> {
    items: IndexSet<T>,
    link: Option<Link>,
    depth: Depth,
}

impl<T: Hash + Eq> TrackedSet<T> {
    pub fn new() -> Self {
        Self::from_set(IndexSet::new())
    }

    fn from_set(items: IndexSet<T>) -> Self {
        Self {
            items,
            link: None,
            depth: Depth::Value,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.link.is_some()
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    fn read(&self) {
        if let Some(link) = &self.link {
            link.report_read();
        }
    }

    fn changed(&self) {
        if let Some(link) = &self.link {
            link.report_changed();
        }
    }

    pub fn len(&self) -> usize {
        self.read();
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<T>,
    {
        self.read();
        self.items.contains(value)
    }

    pub fn iter(&self) -> indexmap::set::Iter<'_, T> {
        self.read();
        self.items.iter()
    }

    /// Add `value`; returns false if it was already present.
    pub fn insert(&mut self, value: T) -> bool {
        let inserted = self.items.insert(value);
        self.changed();
        inserted
    }

    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<T>,
    {
        let removed = self.items.shift_remove(value);
        self.changed();
        removed
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.changed();
    }

    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.items.retain(keep);
        self.changed();
    }
}

impl<T> Instrument for TrackedSet<T> {
    fn instrument(&mut self, link: Option<Link>, depth: Depth) {
        self.link = effective_link(link, depth);
        self.depth = depth;
    }
}

impl<T: Hash + Eq> Default for TrackedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Hash + Eq> Clone for TrackedSet<T> {
    fn clone(&self) -> Self {
        Self::from_set(self.items.clone())
    }
}

impl<T: Hash + Eq> PartialEq for TrackedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: fmt::Debug> fmt::Debug for TrackedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.items.iter()).finish()
    }
}

impl<T: Hash + Eq> FromIterator<T> for TrackedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_set(iter.into_iter().collect())
    }
}
