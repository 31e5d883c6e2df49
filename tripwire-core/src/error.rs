//! Error types.
//!
//! Misuse of the engine (invoking something already disposed, unbalanced
//! mutation scopes) is reported through [`ReactiveError`]. Panics raised by
//! user code are never caught; they unwind through the engine after its
//! bookkeeping guards have run.

use thiserror::Error;

/// Errors reported by the reactive engine.
#[derive(Debug, Error)]
pub enum ReactiveError {
    /// A watcher, mutator or computed trigger was invoked after `dispose()`.
    #[error("cannot invoke a disposed {kind}")]
    Disposed {
        /// Which kind of object was disposed.
        kind: &'static str,
    },

    /// `exit_mutation_scope` was called while no scope was open.
    #[error("exit_mutation_scope called without a matching enter_mutation_scope")]
    ScopeUnderflow,

    /// A manager configuration document could not be parsed.
    #[error("invalid manager configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl ReactiveError {
    pub(crate) fn disposed(kind: &'static str) -> Self {
        Self::Disposed { kind }
    }

    /// True for [`ReactiveError::Disposed`].
    pub fn is_disposed(&self) -> bool {
        matches!(self, Self::Disposed { .. })
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReactiveError>;
