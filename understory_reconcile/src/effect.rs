// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred commit actions.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use crate::host::HostTree;

/// Commit phase of an effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommitPhase {
    /// Host tree mutations.
    Mutation,
    /// Work that reads layout after mutations land.
    Layout,
    /// Work that may run after the frame is visible.
    Passive,
}

impl CommitPhase {
    /// All phases in commit order.
    pub const ALL: [Self; 3] = [Self::Mutation, Self::Layout, Self::Passive];
}

impl fmt::Display for CommitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mutation => "mutation",
            Self::Layout => "layout",
            Self::Passive => "passive",
        })
    }
}

/// A side effect queued during render and applied during commit.
pub trait Effect {
    /// Applies the effect.
    fn commit(&self, host: &dyn HostTree);

    /// Called instead of [`commit`](Self::commit) when the frame that queued
    /// the effect failed and its queues are dropped.
    fn discard(&self) {}
}

impl<F: Fn(&dyn HostTree)> Effect for F {
    fn commit(&self, host: &dyn HostTree) {
        self(host);
    }
}

/// Append-only list of effects for one phase.
///
/// Effects commit in insertion order. [`take`](Self::take) drains the whole
/// queue at once, so an effect queued while a phase commits lands in the
/// next flush rather than the current one.
#[derive(Default)]
pub struct EffectQueue {
    effects: Vec<Rc<dyn Effect>>,
}

impl fmt::Debug for EffectQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectQueue")
            .field("len", &self.effects.len())
            .finish()
    }
}

impl EffectQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an effect.
    pub fn push(&mut self, effect: Rc<dyn Effect>) {
        self.effects.push(effect);
    }

    /// Number of queued effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Removes and returns every queued effect.
    pub fn take(&mut self) -> Vec<Rc<dyn Effect>> {
        core::mem::take(&mut self.effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use alloc::vec;
    use core::cell::RefCell;

    #[test]
    fn take_drains_in_insertion_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut queue = EffectQueue::new();
        for i in 0..3 {
            let log = log.clone();
            queue.push(Rc::new(move |_: &dyn HostTree| log.borrow_mut().push(i)));
        }
        assert_eq!(queue.len(), 3);

        let host = MemoryHost::new();
        for effect in queue.take() {
            effect.commit(&host);
        }
        assert!(queue.is_empty());
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }
}
