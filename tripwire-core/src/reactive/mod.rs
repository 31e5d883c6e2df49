//! Reactive Primitives
//!
//! This module implements the trigger/watcher protocol: triggers, watchers,
//! computed triggers, mutators, and the per-thread manager that wires them
//! together.
//!
//! # Concepts
//!
//! ## Triggers
//!
//! A Trigger holds a value. Reading it while a watcher executes subscribes
//! that watcher; writing it notifies the subscribers.
//!
//! ## Watchers
//!
//! A Watcher wraps a function. Its dependencies are whatever triggers the
//! latest execution read, nothing more; they are rediscovered from scratch
//! every time it runs.
//!
//! ## Computed Triggers
//!
//! A Computed trigger caches a value derived from other triggers. It
//! recomputes eagerly while someone subscribes to it and lazily otherwise.
//!
//! ## Mutation Scopes
//!
//! Inside a mutation scope (or a Mutator call) change notifications are
//! deferred and deduplicated, so a watcher responds once per batch.
//!
//! # Implementation Notes
//!
//! Dependency discovery uses an explicit stack of executing watchers kept
//! by the [`Manager`]. Edges are stored inside the manager, keyed by id, in
//! both directions; handles never point at each other.

mod computed;
mod context;
mod id;
mod manager;
mod mutator;
mod trigger;
mod watcher;

pub use computed::Computed;
pub use context::WatcherFrame;
pub use id::{TriggerId, WatcherId};
pub use manager::Manager;
pub use mutator::{mutation_scope, MutationScope, Mutator};
pub use trigger::Trigger;
pub use watcher::Watcher;
