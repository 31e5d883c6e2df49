//! Execution Frames
//!
//! A [`WatcherFrame`] marks one watcher execution on the manager's
//! active-watcher stack. It pushes on creation and pops when dropped, so
//! the stack is restored on every exit path, including unwinding out of a
//! panicking watched function.
//!
//! Frames nest: a watcher whose function executes another watcher (for
//! instance by reading a computed trigger) pushes a second frame on top of
//! its own.

use super::id::WatcherId;
use super::manager::Manager;

/// Guard that keeps a watcher on the active stack while alive.
pub struct WatcherFrame {
    watcher: WatcherId,
}

impl WatcherFrame {
    /// Push `watcher` onto the active stack until the frame is dropped.
    pub fn enter(watcher: WatcherId) -> Self {
        Manager::push_watcher(watcher);
        Self { watcher }
    }

    /// The watcher this frame belongs to.
    pub fn watcher(&self) -> WatcherId {
        self.watcher
    }
}

impl Drop for WatcherFrame {
    fn drop(&mut self) {
        let popped = Manager::pop_watcher();

        // Frames are strictly LIFO; a mismatch means a frame escaped its scope.
        debug_assert_eq!(
            popped,
            Some(self.watcher),
            "WatcherFrame mismatch: expected {:?}, got {:?}",
            self.watcher,
            popped
        );
    }
}
