//! Reactive Manager
//!
//! The manager is the single coordinator that wires trigger reads, watcher
//! execution and change notification together. Nothing else owns any of
//! its state; triggers, watchers and mutators only talk to it through the
//! associated functions on [`Manager`].
//!
//! # State
//!
//! - The active-watcher stack: watchers whose function is currently on the
//!   call path, innermost last.
//! - Subscription edges, stored in both directions: trigger to subscribed
//!   watchers, watcher to tracked triggers. Both sides are updated together
//!   so that `T` tracks `W` exactly when `W` tracks `T`.
//! - A registry mapping live watcher ids to weak responder handles.
//! - The mutation-scope counter and the deferred set of watchers waiting
//!   for the outermost scope to exit.
//!
//! # Re-entrancy
//!
//! Responders may read and write triggers, create and dispose watchers, and
//! open further scopes. The manager never calls a responder while its own
//! state is borrowed. Every dispatch goes through the deferred set: the
//! drain pops one watcher at a time, releases the state, then responds.
//! Watchers behind computed triggers are popped before plain ones, so a
//! computed value has settled by the time its readers respond.
//! Changes reported while a drain is running join the same set, so a
//! watcher reached by several paths still responds once, and a watcher
//! disposed before its turn is never called.
//!
//! # Threads
//!
//! State is thread-local. Each thread gets its own independent manager,
//! and engine handles are `!Send`, so a graph never spans threads.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use indexmap::IndexSet;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use super::id::{TriggerId, WatcherId};
use crate::config::ManagerConfig;
use crate::error::{ReactiveError, Result};

/// Something the manager can notify when a dependency changes.
pub(crate) trait Respond {
    fn respond(&self);
}

#[derive(Default)]
struct ManagerState {
    stack: SmallVec<[WatcherId; 8]>,
    registry: HashMap<WatcherId, Weak<dyn Respond>>,
    derived: HashSet<WatcherId>,
    subscribers: HashMap<TriggerId, IndexSet<WatcherId>>,
    tracked: HashMap<WatcherId, IndexSet<TriggerId>>,
    scope_depth: usize,
    deferred: IndexSet<WatcherId>,
    draining: bool,
    config: ManagerConfig,
}

impl ManagerState {
    /// Pop the oldest deferred watcher that is still alive, derived
    /// watchers first.
    fn next_deferred(&mut self) -> Option<Rc<dyn Respond>> {
        loop {
            let index = self
                .deferred
                .iter()
                .position(|id| self.derived.contains(id))
                .unwrap_or(0);
            let id = self.deferred.shift_remove_index(index)?;
            if let Some(watcher) = self.registry.get(&id).and_then(Weak::upgrade) {
                return Some(watcher);
            }
        }
    }

    /// True if changes must wait in the deferred set.
    fn defers(&self) -> bool {
        self.scope_depth > 0 || self.draining
    }

    /// Drop every edge of a watcher and take it out of the deferred set.
    fn detach(&mut self, watcher: WatcherId) {
        if let Some(triggers) = self.tracked.remove(&watcher) {
            for trigger in triggers {
                if let Some(subs) = self.subscribers.get_mut(&trigger) {
                    subs.shift_remove(&watcher);
                    if subs.is_empty() {
                        self.subscribers.remove(&trigger);
                    }
                }
            }
        }
        self.deferred.shift_remove(&watcher);
    }
}

thread_local! {
    static STATE: RefCell<ManagerState> = RefCell::new(ManagerState::default());
}

fn with_state<R>(f: impl FnOnce(&mut ManagerState) -> R) -> R {
    STATE.with(|state| f(&mut state.borrow_mut()))
}

/// Variant for `Drop` paths, which may run during thread teardown.
fn try_with_state(f: impl FnOnce(&mut ManagerState)) {
    let _ = STATE.try_with(|state| {
        if let Ok(mut state) = state.try_borrow_mut() {
            f(&mut state);
        }
    });
}

/// Marks the drain as running. Dropping it ends the drain, discarding
/// whatever is left if a responder panicked.
struct Drain;

impl Drain {
    fn begin() -> Self {
        with_state(|s| s.draining = true);
        Drain
    }
}

impl Drop for Drain {
    fn drop(&mut self) {
        try_with_state(|s| {
            s.draining = false;
            s.deferred.clear();
        });
    }
}

/// Respond to deferred watchers in order until none are left. The caller
/// has checked that no drain is running and no scope is open.
fn drain() {
    let _drain = Drain::begin();
    let mut responded = 0usize;
    while let Some(watcher) = with_state(ManagerState::next_deferred) {
        watcher.respond();
        responded += 1;
    }
    if responded > 0 {
        debug!(watchers = responded, "drained deferred watchers");
    }
}

/// The per-thread reactive coordinator.
///
/// This is a zero-sized facade; all state lives in thread-local storage.
pub struct Manager;

impl Manager {
    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    pub(crate) fn register(id: WatcherId, watcher: Weak<dyn Respond>) {
        with_state(|s| {
            s.registry.insert(id, watcher);
        });
    }

    /// Detach and unregister a watcher. Safe to call from `Drop`.
    pub(crate) fn release(id: WatcherId) {
        try_with_state(|s| {
            s.detach(id);
            s.registry.remove(&id);
            s.derived.remove(&id);
        });
        trace!(watcher = ?id, "watcher released");
    }

    /// Mark a watcher as the internal watcher of a computed trigger.
    pub(crate) fn mark_derived(id: WatcherId) {
        with_state(|s| {
            s.derived.insert(id);
        });
    }

    /// Drop all edges of a watcher before it re-executes.
    pub(crate) fn clear_watcher_edges(id: WatcherId) {
        with_state(|s| s.detach(id));
    }

    /// Drop all edges of a trigger that is going away. Safe to call from `Drop`.
    pub(crate) fn forget_trigger(id: TriggerId) {
        try_with_state(|s| {
            if let Some(watchers) = s.subscribers.remove(&id) {
                for watcher in watchers {
                    if let Some(triggers) = s.tracked.get_mut(&watcher) {
                        triggers.shift_remove(&id);
                    }
                }
            }
        });
    }

    // ------------------------------------------------------------------
    // Active-watcher stack
    // ------------------------------------------------------------------

    /// Push a watcher onto the active stack.
    ///
    /// Prefer [`WatcherFrame`](super::context::WatcherFrame), which pops on
    /// every exit path.
    pub fn push_watcher(id: WatcherId) {
        with_state(|s| s.stack.push(id));
        trace!(watcher = ?id, "watcher pushed");
    }

    /// Pop the innermost watcher off the active stack.
    pub fn pop_watcher() -> Option<WatcherId> {
        let popped = with_state(|s| s.stack.pop());
        trace!(watcher = ?popped, "watcher popped");
        popped
    }

    /// The innermost executing watcher, if any.
    pub fn current_watcher() -> Option<WatcherId> {
        with_state(|s| s.stack.last().copied())
    }

    /// Check whether any watcher is executing.
    pub fn is_tracking() -> bool {
        with_state(|s| !s.stack.is_empty())
    }

    /// Number of watcher executions on the call path.
    pub fn active_depth() -> usize {
        with_state(|s| s.stack.len())
    }

    // ------------------------------------------------------------------
    // Read / change protocol
    // ------------------------------------------------------------------

    /// Record that `trigger` was read.
    ///
    /// Every watcher on the active stack gets a bidirectional edge to the
    /// trigger, innermost first. Watchers already released (disposed while
    /// still executing) are skipped.
    pub fn notify_trigger_read(trigger: TriggerId) {
        with_state(|s| {
            if s.stack.is_empty() {
                return;
            }
            for watcher in s.stack.iter().rev() {
                if !s.registry.contains_key(watcher) {
                    continue;
                }
                s.subscribers.entry(trigger).or_default().insert(*watcher);
                s.tracked.entry(*watcher).or_default().insert(trigger);
            }
        });
    }

    /// Report that `trigger` changed.
    ///
    /// The subscribers are added to the deferred set. Inside a mutation
    /// scope, or while a drain is already running, they wait there.
    /// Otherwise they respond immediately, before this call returns, in
    /// subscription order with derived watchers first.
    pub fn notify_trigger_changed(trigger: TriggerId) {
        let immediate = with_state(|s| {
            let Some(subs) = s.subscribers.get(&trigger).filter(|subs| !subs.is_empty()) else {
                if s.config.report_orphan_changes {
                    warn!(trigger = ?trigger, "change reported for a trigger without subscribers");
                }
                return false;
            };
            let defers = s.defers();
            s.deferred.extend(subs.iter().copied());
            if defers {
                trace!(trigger = ?trigger, deferred = s.deferred.len(), "change deferred");
            }
            !defers
        });

        if immediate {
            trace!(trigger = ?trigger, "dispatching change");
            drain();
        }
    }

    /// True if at least one watcher subscribes to `trigger`.
    pub fn has_subscribers(trigger: TriggerId) -> bool {
        Self::subscriber_count(trigger) > 0
    }

    /// Number of watchers subscribed to `trigger`.
    pub fn subscriber_count(trigger: TriggerId) -> usize {
        with_state(|s| s.subscribers.get(&trigger).map_or(0, IndexSet::len))
    }

    /// Number of triggers `watcher` currently tracks.
    pub fn tracked_count(watcher: WatcherId) -> usize {
        with_state(|s| s.tracked.get(&watcher).map_or(0, IndexSet::len))
    }

    /// Check both directions of the edge between `trigger` and `watcher`.
    ///
    /// Returns `None` if the two sides disagree, which would be a bug.
    pub fn is_subscribed(trigger: TriggerId, watcher: WatcherId) -> Option<bool> {
        with_state(|s| {
            let forward = s
                .subscribers
                .get(&trigger)
                .is_some_and(|subs| subs.contains(&watcher));
            let backward = s
                .tracked
                .get(&watcher)
                .is_some_and(|triggers| triggers.contains(&trigger));
            (forward == backward).then_some(forward)
        })
    }

    // ------------------------------------------------------------------
    // Mutation scopes
    // ------------------------------------------------------------------

    /// Open a mutation scope. Scopes nest; only the outermost exit drains.
    pub fn enter_mutation_scope() {
        let depth = with_state(|s| {
            s.scope_depth += 1;
            s.scope_depth
        });
        trace!(depth, "mutation scope entered");
    }

    /// Close a mutation scope.
    ///
    /// When the count returns to zero, every deferred watcher responds
    /// exactly once, derived watchers first and otherwise in the order it
    /// was first deferred. A scope opened and
    /// closed by a responder leaves its changes to the running drain.
    pub fn exit_mutation_scope() -> Result<()> {
        let drains = with_state(|s| {
            if s.scope_depth == 0 {
                return Err(ReactiveError::ScopeUnderflow);
            }
            s.scope_depth -= 1;
            Ok(!s.defers())
        })?;

        if drains {
            drain();
        }
        Ok(())
    }

    /// Current mutation-scope nesting depth.
    pub fn scope_depth() -> usize {
        with_state(|s| s.scope_depth)
    }

    /// Number of watchers waiting for the outermost scope to exit.
    pub fn deferred_count() -> usize {
        with_state(|s| s.deferred.len())
    }

    /// Take a watcher out of the deferred set.
    pub fn remove_deferred_watcher(watcher: WatcherId) {
        with_state(|s| {
            s.deferred.shift_remove(&watcher);
        });
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Install a configuration for this thread's manager.
    pub fn configure(config: ManagerConfig) {
        with_state(|s| s.config = config);
    }

    /// The configuration currently in effect on this thread.
    pub fn config() -> ManagerConfig {
        with_state(|s| s.config)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
