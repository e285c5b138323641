// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifecycle events emitted by the runtime.

use crate::effect::CommitPhase;
use crate::error::RenderError;
use crate::lane::Lanes;

/// A lifecycle event for one frame.
///
/// For every frame, observers see `UpdateStart`, `RenderStart`, `RenderEnd`,
/// a `CommitStart`/`CommitEnd` pair per non-empty phase and finally
/// `UpdateEnd`. A frame whose render fails sees `UpdateStart`,
/// `RenderStart` and `UpdateFailure` only.
#[derive(Clone, Debug)]
pub enum RuntimeEvent {
    /// A frame started.
    UpdateStart {
        /// Frame id.
        id: u64,
        /// Lanes of the frame.
        lanes: Lanes,
    },
    /// The render loop started.
    RenderStart {
        /// Frame id.
        id: u64,
    },
    /// The render loop reached a fixed point.
    RenderEnd {
        /// Frame id.
        id: u64,
    },
    /// A commit phase started.
    CommitStart {
        /// Frame id.
        id: u64,
        /// The phase.
        phase: CommitPhase,
        /// Number of effects being committed.
        effects: usize,
    },
    /// A commit phase ended.
    CommitEnd {
        /// Frame id.
        id: u64,
        /// The phase.
        phase: CommitPhase,
    },
    /// The frame finished.
    UpdateEnd {
        /// Frame id.
        id: u64,
    },
    /// The frame failed during render.
    UpdateFailure {
        /// Frame id.
        id: u64,
        /// The unhandled error.
        error: RenderError,
    },
}

impl RuntimeEvent {
    /// Frame id of the event.
    #[must_use]
    pub fn id(&self) -> u64 {
        match self {
            Self::UpdateStart { id, .. }
            | Self::RenderStart { id }
            | Self::RenderEnd { id }
            | Self::CommitStart { id, .. }
            | Self::CommitEnd { id, .. }
            | Self::UpdateEnd { id }
            | Self::UpdateFailure { id, .. } => *id,
        }
    }
}

/// Receives [`RuntimeEvent`]s.
pub trait RuntimeObserver {
    /// Called for every event, in order.
    fn on_event(&self, event: &RuntimeEvent);
}

impl<F: Fn(&RuntimeEvent)> RuntimeObserver for F {
    fn on_event(&self, event: &RuntimeEvent) {
        self(event);
    }
}

/// Handle returned by [`Runtime::add_observer`](crate::Runtime::add_observer).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);
