// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-flush state.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use crate::coroutine::Coroutine;
use crate::effect::{CommitPhase, EffectQueue};
use crate::lane::Lanes;

/// The mutable state of one flush.
///
/// Coroutines resumed during a frame may push further coroutines; the render
/// loop keeps draining until none are left. Effects queued during render
/// commit only after that.
pub struct Frame {
    id: u64,
    lanes: Lanes,
    pub(crate) pending_coroutines: Vec<Rc<dyn Coroutine>>,
    pub(crate) mutation_effects: EffectQueue,
    pub(crate) layout_effects: EffectQueue,
    pub(crate) passive_effects: EffectQueue,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("id", &self.id)
            .field("lanes", &self.lanes)
            .field("pending_coroutines", &self.pending_coroutines.len())
            .field("mutation_effects", &self.mutation_effects)
            .field("layout_effects", &self.layout_effects)
            .field("passive_effects", &self.passive_effects)
            .finish()
    }
}

impl Frame {
    pub(crate) fn new(id: u64, lanes: Lanes) -> Self {
        Self {
            id,
            lanes,
            pending_coroutines: Vec::new(),
            mutation_effects: EffectQueue::new(),
            layout_effects: EffectQueue::new(),
            passive_effects: EffectQueue::new(),
        }
    }

    /// Monotonic frame id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Lanes being flushed.
    #[must_use]
    pub fn lanes(&self) -> Lanes {
        self.lanes
    }

    /// Number of coroutines waiting for the next render pass.
    #[must_use]
    pub fn pending_coroutines(&self) -> usize {
        self.pending_coroutines.len()
    }

    /// The effect queue for `phase`.
    #[must_use]
    pub fn effects(&self, phase: CommitPhase) -> &EffectQueue {
        match phase {
            CommitPhase::Mutation => &self.mutation_effects,
            CommitPhase::Layout => &self.layout_effects,
            CommitPhase::Passive => &self.passive_effects,
        }
    }

    pub(crate) fn effects_mut(&mut self, phase: CommitPhase) -> &mut EffectQueue {
        match phase {
            CommitPhase::Mutation => &mut self.mutation_effects,
            CommitPhase::Layout => &mut self.layout_effects,
            CommitPhase::Passive => &mut self.passive_effects,
        }
    }
}
