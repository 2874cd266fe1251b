//! Re-entrancy guard flags.

use std::cell::Cell;

/// Holds a flag raised for its lifetime.
///
/// Native calls made while the guard is alive may synchronously re-enter
/// the code that created it; the second [`enter`](Self::enter) returns
/// `None` instead of recursing.
pub(crate) struct ReentrancyGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> ReentrancyGuard<'a> {
    pub(crate) fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self { flag })
        }
    }
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_blocks_nested_entry() {
        let flag = Cell::new(false);
        {
            let outer = ReentrancyGuard::enter(&flag);
            assert!(outer.is_some());
            assert!(ReentrancyGuard::enter(&flag).is_none());
        }
        assert!(!flag.get());
        assert!(ReentrancyGuard::enter(&flag).is_some());
    }
}
