//! Tracked plain record.

use std::fmt;

use indexmap::IndexMap;

use super::{effective_link, Composite, Depth, Instrument, Link};

const KIND: Composite = Composite::Record;

/// A record of named fields whose reads and assignments report to the
/// owning trigger.
///
/// Records do not consume depth: under [`Depth::Deep`] the fields are
/// instrumented at `Deep` as well, however far records nest.
pub struct TrackedRecord<V> {
    fields: IndexMap<String, V>,
    link: Option<Link>,
    depth: Depth,
}

impl<V> TrackedRecord<V> {
    pub fn new() -> Self {
        Self::from_fields(IndexMap::new())
    }

    fn from_fields(fields: IndexMap<String, V>) -> Self {
        Self {
            fields,
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

    pub fn get(&self, field: &str) -> Option<&V> {
        self.read();
        self.fields.get(field)
    }

    /// Mutable access to a field, for reaching nested tracked values.
    ///
    /// Assigning a whole field value through the returned reference is not
    /// reported, and the new field value is not instrumented, so later writes
    /// inside it go unseen at any depth. Replace field values with [`set`](Self::set).
    pub fn get_mut(&mut self, field: &str) -> Option<&mut V> {
        self.read();
        self.fields.get_mut(field)
    }

    /// Field existence check.
    pub fn has(&self, field: &str) -> bool {
        self.read();
        self.fields.contains_key(field)
    }

    /// Field names in definition order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.read();
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> + '_ {
        self.read();
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.read();
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove a field, returning its value.
    pub fn delete(&mut self, field: &str) -> Option<V> {
        let removed = self.fields.shift_remove(field);
        self.changed();
        removed
    }

    pub fn clear(&mut self) {
        self.fields.clear();
        self.changed();
    }
}

impl<V: Instrument> TrackedRecord<V> {
    /// Assign a field, returning the previous value.
    pub fn set(&mut self, field: impl Into<String>, mut value: V) -> Option<V> {
        value.instrument(self.link, self.depth.nested(KIND));
        let previous = self.fields.insert(field.into(), value);
        self.changed();
        previous
    }
}

impl<V: Instrument> Instrument for TrackedRecord<V> {
    fn instrument(&mut self, link: Option<Link>, depth: Depth) {
        self.link = effective_link(link, depth);
        self.depth = depth;
        let nested = depth.nested(KIND);
        for value in self.fields.values_mut() {
            value.instrument(self.link, nested);
        }
    }
}

impl<V> Default for TrackedRecord<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> Clone for TrackedRecord<V> {
    fn clone(&self) -> Self {
        Self::from_fields(self.fields.clone())
    }
}

impl<V: PartialEq> PartialEq for TrackedRecord<V> {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl<V: fmt::Debug> fmt::Debug for TrackedRecord<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fields.iter()).finish()
    }
}

impl<S: Into<String>, V> FromIterator<(S, V)> for TrackedRecord<V> {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        Self::from_fields(iter.into_iter().map(|(name, value)| (name.into(), value)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Trigger;
    use crate::tracked::test_support::observe;

    /// Three levels of records, innermost holding a number.
    type Nested = TrackedRecord<TrackedRecord<TrackedRecord<i64>>>;

    fn nested() -> Nested {
        let leaf: TrackedRecord<i64> = [("count", 0)].into_iter().collect();
        let middle: TrackedRecord<_> = [("leaf", leaf)].into_iter().collect();
        [("middle", middle)].into_iter().collect()
    }

    fn bump(root: &mut Nested) {
        if let Some(leaf) = root
            .get_mut("middle")
            .and_then(|middle| middle.get_mut("leaf"))
        {
            leaf.set("count", 1);
        }
    }

    #[test]
    fn deep_records_never_run_out_of_depth() {
        let state = Trigger::with_depth(nested(), Depth::Deep);
        let (_watcher, hits) = observe(&state, |root| {
            root.get("middle");
        });

        state.with_mut(bump);
        assert_eq!(hits.get(), 1);
        let leaf_depth = state.with_untracked(|root| {
            root.fields["middle"].fields["leaf"].depth()
        });
        assert_eq!(leaf_depth, Depth::Deep);
    }

    #[test]
    fn shallow_records_track_only_top_level() {
        let state = Trigger::with_depth(nested(), Depth::Shallow);
        let (_watcher, hits) = observe(&state, |root| {
            root.has("middle");
        });

        state.with_mut(bump);
        assert_eq!(hits.get(), 0);

        state.with_mut(|root| {
            root.delete("middle");
        });
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn keys_keep_definition_order() {
        let mut record = TrackedRecord::new();
        record.set("b", 1);
        record.set("a", 2);
        record.set("b", 3);
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(record.get("b"), Some(&3));
    }
}
