//! Reference-counted deferral scope.
//!
//! A [`DeferScope`] is a depth counter. While the depth is above zero,
//! owners buffer their changes; when the outermost scope exits they apply
//! everything at once. Nested scopes compose: only the exit that returns
//! the depth to zero reports [`DeferExit::Outermost`].

use std::cell::Cell;

use crate::logging::targets;

/// Outcome of leaving a deferral scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferExit {
    /// The outermost scope exited; buffered changes must be applied now.
    Outermost,
    /// An inner scope exited; changes stay buffered.
    Nested,
    /// `exit` was called with no open scope. The depth stays at zero.
    Unbalanced,
}

/// Depth counter for batched updates. Never goes negative.
#[derive(Debug, Default)]
pub struct DeferScope {
    depth: Cell<usize>,
}

impl DeferScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a scope, returning the new depth.
    pub fn enter(&self) -> usize {
        let depth = self.depth.get() + 1;
        self.depth.set(depth);
        depth
    }

    /// Close a scope.
    pub fn exit(&self) -> DeferExit {
        match self.depth.get() {
            0 => {
                tracing::warn!(target: targets::DEFER, "defer scope exited without a matching enter");
                DeferExit::Unbalanced
            }
            1 => {
                self.depth.set(0);
                DeferExit::Outermost
            }
            depth => {
                self.depth.set(depth - 1);
                DeferExit::Nested
            }
        }
    }

    /// Check if changes are currently being buffered.
    pub fn is_deferring(&self) -> bool {
        self.depth.get() > 0
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.depth.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_scopes_flush_once() {
        let scope = DeferScope::new();
        assert!(!scope.is_deferring());

        assert_eq!(scope.enter(), 1);
        assert_eq!(scope.enter(), 2);
        assert_eq!(scope.enter(), 3);
        assert!(scope.is_deferring());

        assert_eq!(scope.exit(), DeferExit::Nested);
        assert_eq!(scope.exit(), DeferExit::Nested);
        assert_eq!(scope.exit(), DeferExit::Outermost);
        assert!(!scope.is_deferring());
    }

    #[test]
    fn test_unbalanced_exit_never_goes_negative() {
        let scope = DeferScope::new();
        assert_eq!(scope.exit(), DeferExit::Unbalanced);
        assert_eq!(scope.depth(), 0);

        // The counter still works normally afterwards
        scope.enter();
        assert_eq!(scope.exit(), DeferExit::Outermost);
    }
}
