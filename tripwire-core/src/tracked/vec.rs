//! Tracked ordered sequence.

use std::cmp::Ordering;
use std::fmt;

use super::{effective_link, Composite, Depth, Instrument, Link};

const KIND: Composite = Composite::Sequence;

/// A `Vec` whose element reads and writes report to the owning trigger.
///
/// Reads (`get`, `len`, `iter`, ...) report a read; mutating operations
/// (`set`, `push`, `remove`, `sort`, ...) report a change after the
/// underlying vector has been updated. Assigning through
/// [`get_mut`](Self::get_mut) is not observed at this level; only tracked
/// values nested inside the element see it.
pub struct TrackedVec<T> {
    data: Vec<T>,
    link: Option<Link>,
    depth: Depth,
}

impl<T> TrackedVec<T> {
    /// Create an empty, detached sequence.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Wrap an existing vector. The result is detached until stored.
    pub fn from_vec(data: Vec<T>) -> Self {
        Self {
            data,
            link: None,
            depth: Depth::Value,
        }
    }

    /// True once stored under a tracked depth.
    pub fn is_attached(&self) -> bool {
        self.link.is_some()
    }

    /// Depth this sequence was instrumented with.
    pub fn depth(&self) -> Depth {
        self.depth
    }

    /// Unwrap into the underlying vector.
    pub fn into_inner(self) -> Vec<T> {
        self.data
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

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn len(&self) -> usize {
        self.read();
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.read();
        self.data.get(index)
    }

    /// Mutable access to an element, for reaching nested tracked values.
    ///
    /// Assigning a whole element through the returned reference is not
    /// reported, and the new element is not instrumented, so later writes
    /// inside it go unseen at any depth. Replace elements with [`set`](Self::set).
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.read();
        self.data.get_mut(index)
    }

    pub fn first(&self) -> Option<&T> {
        self.read();
        self.data.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.read();
        self.data.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.read();
        self.data.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        self.read();
        &self.data
    }

    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.read();
        self.data.contains(value)
    }

    /// Copy the elements out as a plain vector of detached values.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.read();
        self.data.clone()
    }

    // =========================================================================
    // Writes that never store a new value
    // =========================================================================

    pub fn pop(&mut self) -> Option<T> {
        let popped = self.data.pop();
        self.changed();
        popped
    }

    /// Remove and return the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds, like [`Vec::remove`].
    pub fn remove(&mut self, index: usize) -> T {
        let removed = self.data.remove(index);
        self.changed();
        removed
    }

    /// # Panics
    ///
    /// Panics if either index is out of bounds, like [`slice::swap`].
    pub fn swap(&mut self, a: usize, b: usize) {
        self.data.swap(a, b);
        self.changed();
    }

    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
        self.changed();
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.changed();
    }

    pub fn reverse(&mut self) {
        self.data.reverse();
        self.changed();
    }

    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.data.retain(keep);
        self.changed();
    }

    pub fn sort_by(&mut self, compare: impl FnMut(&T, &T) -> Ordering) {
        self.data.sort_by(compare);
        self.changed();
    }

    pub fn sort(&mut self)
    where
        T: Ord,
    {
        self.data.sort();
        self.changed();
    }
}

impl<T: Instrument> TrackedVec<T> {
    fn adopt(&self, value: &mut T) {
        value.instrument(self.link, self.depth.nested(KIND));
    }

    /// Assign `value` at `index`, returning the previous element.
    ///
    /// An out-of-bounds index stores nothing and hands `value` back.
    pub fn set(&mut self, index: usize, mut value: T) -> Result<T, T> {
        if index >= self.data.len() {
            return Err(value);
        }
        self.adopt(&mut value);
        let previous = std::mem::replace(&mut self.data[index], value);
        self.changed();
        Ok(previous)
    }

    pub fn push(&mut self, mut value: T) {
        self.adopt(&mut value);
        self.data.push(value);
        self.changed();
    }

    /// # Panics
    ///
    /// Panics if `index > len`, like [`Vec::insert`].
    pub fn insert(&mut self, index: usize, mut value: T) {
        self.adopt(&mut value);
        self.data.insert(index, value);
        self.changed();
    }

    pub fn extend_from(&mut self, values: impl IntoIterator<Item = T>) {
        let nested = self.depth.nested(KIND);
        let link = self.link;
        self.data.extend(values.into_iter().map(|mut value| {
            value.instrument(link, nested);
            value
        }));
        self.changed();
    }
}

impl<T: Instrument> Instrument for TrackedVec<T> {
    fn instrument(&mut self, link: Option<Link>, depth: Depth) {
        self.link = effective_link(link, depth);
        self.depth = depth;
        let nested = depth.nested(KIND);
        for item in &mut self.data {
            item.instrument(self.link, nested);
        }
    }
}

impl<T> Default for TrackedVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for TrackedVec<T> {
    fn clone(&self) -> Self {
        Self::from_vec(self.data.clone())
    }
}

impl<T: PartialEq> PartialEq for TrackedVec<T> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<T: fmt::Debug> fmt::Debug for TrackedVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.data.iter()).finish()
    }
}

impl<T> From<Vec<T>> for TrackedVec<T> {
    fn from(data: Vec<T>) -> Self {
        Self::from_vec(data)
    }
}

impl<T> FromIterator<T> for TrackedVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a TrackedVec<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
