//! Identifiers for triggers and watchers.
//!
//! The manager keys every subscription edge by these ids rather than by
//! pointers, so edges can be dropped explicitly on disposal without any
//! help from the handles themselves.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a trigger (plain or computed).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerId(u64);

impl TriggerId {
    /// Generate a new unique trigger ID.
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Unique identifier for a watcher.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatcherId(u64);

impl WatcherId {
    /// Generate a new unique watcher ID.
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for WatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = WatcherId::next();
        let b = WatcherId::next();
        assert_ne!(a, b);

        let t1 = TriggerId::next();
        let t2 = TriggerId::next();
        assert_ne!(t1, t2);
    }

    #[test]
    fn debug_is_compact() {
        let id = TriggerId(7);
        assert_eq!(format!("{id:?}"), "T7");
        assert_eq!(format!("{:?}", WatcherId(3)), "W3");
    }
}
