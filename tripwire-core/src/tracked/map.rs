//! Tracked key-value mapping.

use std::fmt;
use std::hash::Hash;

use indexmap::{Equivalent, IndexMap};

use super::{effective_link, Composite, Depth, Instrument, Link};

const KIND: Composite = Composite::Mapping;

/// An insertion-ordered map whose lookups and updates report to the owning
/// trigger.
///
/// Keys are never instrumented; values are, using the mapping's nested
/// depth. Removal keeps the order of the remaining entries.
pub struct TrackedMap<K, V> {
    entries: IndexMap<K, V>,
    link: Option<Link>,
    depth: Depth,
}

impl<K: Hash + Eq, V> TrackedMap<K, V> {
    pub fn new() -> Self {
        Self::from_map(IndexMap::new())
    }

    fn from_map(entries: IndexMap<K, V>) -> Self {
        Self {
            entries,
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
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.read();
        self.entries.get(key)
    }

    /// Mutable access to a value, for reaching nested tracked values.
    ///
    /// Assigning a whole value through the returned reference is not
    /// reported, and the new value is not instrumented, so later writes
    /// inside it go unseen at any depth. Replace values with [`insert`](Self::insert).
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.read();
        self.entries.get_mut(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.read();
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, K, V> {
        self.read();
        self.entries.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, K, V> {
        self.read();
        self.entries.values()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, K, V> {
        self.read();
        self.entries.iter()
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let removed = self.entries.shift_remove(key);
        self.changed();
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.changed();
    }

    pub fn retain(&mut self, keep: impl FnMut(&K, &mut V) -> bool) {
        self.entries.retain(keep);
        self.changed();
    }
}

impl<K: Hash + Eq, V: Instrument> TrackedMap<K, V> {
    /// Insert or replace the value under `key`, returning the old value.
    pub fn insert(&mut self, key: K, mut value: V) -> Option<V> {
        value.instrument(self.link, self.depth.nested(KIND));
        let previous = self.entries.insert(key, value);
        self.changed();
        previous
    }
}

impl<K, V: Instrument> Instrument for TrackedMap<K, V> {
    fn instrument(&mut self, link: Option<Link>, depth: Depth) {
        self.link = effective_link(link, depth);
        self.depth = depth;
        let nested = depth.nested(KIND);
        for value in self.entries.values_mut() {
            value.instrument(self.link, nested);
        }
    }
}

impl<K: Hash + Eq, V> Default for TrackedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Hash + Eq, V: Clone> Clone for TrackedMap<K, V> {
    fn clone(&self) -> Self {
        Self::from_map(self.entries.clone())
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for TrackedMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for TrackedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for TrackedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}
