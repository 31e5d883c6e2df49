//! Tripwire Core
//!
//! This crate provides a reactive dependency-tracking and notification
//! engine. A value holder (a *trigger*) discovers which code (a *watcher*)
//! depends on it purely by observing reads during execution, and notifies
//! exactly those dependents when it changes.
//!
//! It implements:
//!
//! - Triggers with equality-gated writes
//! - Watchers that rebuild their dependency set on every execution
//! - Batched, deduplicated notification under nested mutation scopes
//! - Computed triggers that recompute eagerly when observed, lazily when not
//! - Tracked containers (sequences, mappings, sets, records) so nested
//!   mutation is observed with a configurable depth
//!
//! # Architecture
//!
//! - `reactive`: triggers, watchers, computed triggers, mutators, manager
//! - `tracked`: propagation depth and the instrumented container kinds
//! - `config`: per-thread manager configuration
//! - `error`: the crate error type
//!
//! The engine is single threaded. Each thread has its own manager and all
//! handles are `!Send`.
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use tripwire_core::{mutation_scope, Computed, Trigger, Watcher};
//!
//! let first = Trigger::new(String::from("Ada"));
//! let last = Trigger::new(String::from("Lovelace"));
//!
//! let (f, l) = (first.clone(), last.clone());
//! let full = Computed::new(move || format!("{} {}", f.get(), l.get()));
//!
//! let renders = Rc::new(Cell::new(0));
//! let (name, count) = (full.clone(), renders.clone());
//! let view = Watcher::new(move |()| name.get().unwrap(), move || count.set(count.get() + 1));
//! assert_eq!(view.run().unwrap(), "Ada Lovelace");
//!
//! mutation_scope(|| {
//!     first.set(String::from("Grace"));
//!     last.set(String::from("Hopper"));
//! });
//! assert_eq!(full.peek().as_deref(), Some("Grace Hopper"));
//! assert_eq!(renders.get(), 1);
//! ```

pub mod config;
pub mod error;
pub mod reactive;
pub mod tracked;

pub use config::ManagerConfig;
pub use error::{ReactiveError, Result};
pub use reactive::{
    mutation_scope, Computed, Manager, MutationScope, Mutator, Trigger, TriggerId, Watcher,
    WatcherFrame, WatcherId,
};
pub use tracked::{
    Composite, Depth, Instrument, Link, TrackedMap, TrackedRecord, TrackedSet, TrackedVec,
};
