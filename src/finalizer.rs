//! Scope-exit cleanup.
//!
//! A [`Finalizer`] holds one nullary action in a [`Callable`] slot and runs it
//! exactly once when the finalizer goes out of scope, including during
//! unwinding.  [`Finalizer::disarm`] cancels it.

use crate::callable::{Callable, DEFAULT_FOOTPRINT};

/// Runs its action once, on drop.
#[must_use = "a finalizer runs immediately if it is not bound to a variable"]
pub struct Finalizer<'a, const N: usize = DEFAULT_FOOTPRINT> {
    action: Callable<'a, fn(), N>,
}

impl<'a, const N: usize> Finalizer<'a, N> {
    pub fn new(action: impl Fn() + 'a) -> Self {
        Self {
            action: Callable::<fn(), N>::new(action),
        }
    }

    /// Whether the action is still pending.
    pub fn is_armed(&self) -> bool {
        self.action.is_valid()
    }

    /// Cancel the action without running it.
    pub fn disarm(&mut self) {
        self.action.clear();
    }
}

impl<const N: usize> Drop for Finalizer<'_, N> {
    fn drop(&mut self) {
        let action = self.action.take();
        if action.is_valid() {
            action.call();
        }
    }
}
