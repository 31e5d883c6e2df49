//! Container Instrumentation
//!
//! Composite values stored in a [`Trigger`](crate::reactive::Trigger) can be
//! made reactive at element level: reading through a tracked container
//! reports a read on the owning trigger, and mutating it reports a change.
//! Nested field access therefore participates in dependency tracking
//! without a separate trigger per leaf.
//!
//! # Container kinds
//!
//! - [`TrackedVec`]: ordered sequence
//! - [`TrackedMap`]: key-value mapping, insertion ordered
//! - [`TrackedSet`]: set, insertion ordered
//! - [`TrackedRecord`]: plain record with named fields
//!
//! Every kind routes read-like operations through "report read, then
//! delegate" and mutating operations through "delegate, then report
//! changed". Values inserted by a mutating operation are instrumented on the
//! way in, using the container's nested depth.
//!
//! # Depth
//!
//! [`Depth`] bounds how far instrumentation reaches:
//!
//! - `Value`: nothing is instrumented; only the trigger itself is tracked.
//! - `Shallow`: the top-level container is tracked; values inside it are not.
//! - `Deep`: records keep `Deep` for their fields, so record nesting is
//!   unbounded; sequences, mappings and sets hand `Shallow` to their
//!   elements.
//!
//! # Detached values
//!
//! A container without a [`Link`] is plain data. Cloning a container always
//! produces a detached copy, so a value handed out by `Trigger::get` never
//! reports into the trigger it was cloned from.

mod map;
mod record;
mod set;
mod vec;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use map::TrackedMap;
pub use record::TrackedRecord;
pub use set::TrackedSet;
pub use vec::TrackedVec;

use crate::reactive::{Manager, TriggerId};

/// How many levels of a stored value are instrumented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    /// Only the top-level reference is tracked.
    #[default]
    Value,
    /// Entry insertion, removal and assignment in the top-level container.
    Shallow,
    /// Assignments at every nesting level.
    Deep,
}

/// The kind of a tracked container, for depth bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    Sequence,
    Mapping,
    Set,
    Record,
}

impl Depth {
    /// Depth handed to values stored inside a container of `kind` that is
    /// itself instrumented at `self`.
    pub fn nested(self, kind: Composite) -> Depth {
        match (self, kind) {
            (Depth::Deep, Composite::Record) => Depth::Deep,
            (Depth::Deep, _) => Depth::Shallow,
            (Depth::Shallow | Depth::Value, _) => Depth::Value,
        }
    }

    /// True unless this is [`Depth::Value`].
    pub fn is_tracked(self) -> bool {
        self != Depth::Value
    }
}

/// Connection from an instrumented value to the trigger that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    trigger: TriggerId,
}

impl Link {
    pub(crate) fn new(trigger: TriggerId) -> Self {
        Self { trigger }
    }

    /// The owning trigger.
    pub fn trigger(&self) -> TriggerId {
        self.trigger
    }

    /// Report a read of the owning trigger.
    pub fn report_read(&self) {
        Manager::notify_trigger_read(self.trigger);
    }

    /// Report a change of the owning trigger, if anyone is listening.
    pub fn report_changed(&self) {
        if Manager::has_subscribers(self.trigger) {
            Manager::notify_trigger_changed(self.trigger);
        }
    }
}

/// Values that can be stored in a trigger.
///
/// `instrument` is called whenever a value is stored: by the trigger on
/// `set`, and by tracked containers on insertion. Containers record the link
/// when `depth` is tracked (dropping it otherwise) and forward to their
/// elements with [`Depth::nested`]. Leaf values ignore the call.
///
/// Implementing it for a domain type usually means forwarding to the fields
/// that hold containers:
///
/// ```
/// use tripwire_core::tracked::{Depth, Instrument, Link, TrackedVec};
///
/// #[derive(Clone, PartialEq)]
/// struct Inbox {
///     unread: u32,
///     messages: TrackedVec<String>,
/// }
///
/// impl Instrument for Inbox {
///     fn instrument(&mut self, link: Option<Link>, depth: Depth) {
///         self.messages.instrument(link, depth);
///     }
/// }
/// ```
pub trait Instrument {
    /// Attach this value (and, per `depth`, its contents) to `link`.
    fn instrument(&mut self, link: Option<Link>, depth: Depth);
}

macro_rules! leaf_instrument {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Instrument for $ty {
                #[inline]
                fn instrument(&mut self, _link: Option<Link>, _depth: Depth) {}
            }
        )*
    };
}

leaf_instrument!(
    (), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, &'static str,
);

// Std containers, shared pointers, arrays and tuples are plain data. Only
// replacing the whole value through the trigger is observed; writes inside
// them are not.
macro_rules! opaque_instrument {
    ($($ty:ident<$($param:ident),+>),* $(,)?) => {
        $(
            impl<$($param),+> Instrument for $ty<$($param),+> {
                #[inline]
                fn instrument(&mut self, _link: Option<Link>, _depth: Depth) {}
            }
        )*
    };
}

opaque_instrument!(
    Vec<T>, VecDeque<T>, BTreeSet<T>, BTreeMap<K, V>, HashSet<T, S>, HashMap<K, V, S>,
    Rc<T>, Arc<T>,
);

impl<T, const N: usize> Instrument for [T; N] {
    #[inline]
    fn instrument(&mut self, _link: Option<Link>, _depth: Depth) {}
}

macro_rules! tuple_instrument {
    ($(($($name:ident),+)),* $(,)?) => {
        $(
            impl<$($name),+> Instrument for ($($name,)+) {
                #[inline]
                fn instrument(&mut self, _link: Option<Link>, _depth: Depth) {}
            }
        )*
    };
}

tuple_instrument!((A), (A, B), (A, B, C), (A, B, C, D), (A, B, C, D, E), (A, B, C, D, E, F));

impl<T: Instrument> Instrument for Option<T> {
    fn instrument(&mut self, link: Option<Link>, depth: Depth) {
        if let Some(value) = self {
            value.instrument(link, depth);
        }
    }
}

impl<T: Instrument> Instrument for Box<T> {
    fn instrument(&mut self, link: Option<Link>, depth: Depth) {
        (**self).instrument(link, depth);
    }
}

/// Link actually kept by a container instrumented at `depth`.
fn effective_link(link: Option<Link>, depth: Depth) -> Option<Link> {
    if depth.is_tracked() {
        link
    } else {
        None
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::reactive::{Trigger, Watcher};

    /// Run a watcher that reads `trigger` through `read`, counting responses.
    pub(crate) fn observe<V: 'static>(
        trigger: &Trigger<V>,
        read: impl Fn(&V) + 'static,
    ) -> (Watcher, Rc<Cell<usize>>) {
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let source = trigger.clone();
        let watcher = Watcher::new(
            move |()| source.with(|value| read(value)),
            move || counter.set(counter.get() + 1),
        );
        watcher.run().unwrap();
        (watcher, hits)
    }
}
