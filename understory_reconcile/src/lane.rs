// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Update lanes, priorities and scheduling options.

use core::fmt;

bitflags::bitflags! {
    /// Set of reasons an update was requested.
    ///
    /// Two requests for the same coroutine resolve to the same task only when
    /// their combined lanes are equal.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Lanes: u16 {
        /// Base lane of every update.
        const DEFAULT           = 0b0000_0001;
        /// Alternate base lane; the runtime swaps between this and
        /// [`DEFAULT`](Self::DEFAULT) each time a task starts.
        const DEFAULT_ALTERNATE = 0b0000_0010;
        /// Flush immediately instead of dispatching through the host.
        const SYNC              = 0b0000_0100;
        /// Commit mutation and layout inside a view transition.
        const VIEW_TRANSITION   = 0b0000_1000;
        /// Priority lane for input-driven work.
        const USER_BLOCKING     = 0b0001_0000;
        /// Priority lane for work the user will see soon.
        const USER_VISIBLE      = 0b0010_0000;
        /// Priority lane for deferrable work.
        const BACKGROUND        = 0b0100_0000;
    }
}

impl Lanes {
    /// Both base lanes.
    pub const BASE: Self = Self::DEFAULT.union(Self::DEFAULT_ALTERNATE);

    /// All priority lanes.
    pub const PRIORITY: Self = Self::USER_BLOCKING
        .union(Self::USER_VISIBLE)
        .union(Self::BACKGROUND);

    /// Combines scheduling options into a lane set.
    ///
    /// `alternate` selects which base lane is used.
    #[must_use]
    pub fn for_update(priority: TaskPriority, options: &UpdateOptions, alternate: bool) -> Self {
        let mut lanes = if alternate {
            Self::DEFAULT_ALTERNATE
        } else {
            Self::DEFAULT
        };
        lanes |= priority.lane();
        if options.view_transition {
            lanes |= Self::VIEW_TRANSITION;
        }
        if options.flush_sync {
            lanes |= Self::SYNC;
        }
        lanes
    }

    /// Returns the highest priority contained in this set.
    #[must_use]
    pub fn priority(self) -> Option<TaskPriority> {
        if self.contains(Self::USER_BLOCKING) {
            Some(TaskPriority::UserBlocking)
        } else if self.contains(Self::USER_VISIBLE) {
            Some(TaskPriority::UserVisible)
        } else if self.contains(Self::BACKGROUND) {
            Some(TaskPriority::Background)
        } else {
            None
        }
    }
}

/// Host scheduling priority.
///
/// Ordered from most to least urgent, so `UserBlocking < Background`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskPriority {
    /// Work that blocks user input, such as responding to a click.
    UserBlocking,
    /// Work whose result the user will see, but not urgently.
    UserVisible,
    /// Work that can wait until the host is idle.
    Background,
}

impl TaskPriority {
    /// Returns the lane corresponding to this priority.
    #[must_use]
    pub const fn lane(self) -> Lanes {
        match self {
            Self::UserBlocking => Lanes::USER_BLOCKING,
            Self::UserVisible => Lanes::USER_VISIBLE,
            Self::Background => Lanes::BACKGROUND,
        }
    }

    /// Returns the conventional host name for this priority.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserBlocking => "user-blocking",
            Self::UserVisible => "user-visible",
            Self::Background => "background",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for [`Runtime::schedule_update`](crate::Runtime::schedule_update).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Priority of the update. `None` asks the backend for the ambient priority.
    pub priority: Option<TaskPriority>,
    /// Commit mutation and layout inside a view transition.
    pub view_transition: bool,
    /// Flush synchronously instead of dispatching through the host.
    pub flush_sync: bool,
    /// Arrange for a flush. When `false` the task waits for an explicit
    /// [`flush_sync`](crate::Runtime::flush_sync) or
    /// [`flush_async`](crate::Runtime::flush_async).
    pub trigger_flush: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            priority: None,
            view_transition: false,
            flush_sync: false,
            trigger_flush: true,
        }
    }
}

impl UpdateOptions {
    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Requests a view transition around mutation and layout commits.
    #[must_use]
    pub fn with_view_transition(mut self, view_transition: bool) -> Self {
        self.view_transition = view_transition;
        self
    }

    /// Requests a synchronous flush.
    #[must_use]
    pub fn with_flush_sync(mut self, flush_sync: bool) -> Self {
        self.flush_sync = flush_sync;
        self
    }

    /// Controls whether scheduling arranges a flush.
    #[must_use]
    pub fn with_trigger_flush(mut self, trigger_flush: bool) -> Self {
        self.trigger_flush = trigger_flush;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_lane_follows_toggle() {
        let options = UpdateOptions::default();
        let a = Lanes::for_update(TaskPriority::UserVisible, &options, false);
        let b = Lanes::for_update(TaskPriority::UserVisible, &options, true);
        assert_eq!(a, Lanes::DEFAULT | Lanes::USER_VISIBLE);
        assert_eq!(b, Lanes::DEFAULT_ALTERNATE | Lanes::USER_VISIBLE);
        assert_ne!(a, b);
    }

    #[test]
    fn options_add_their_lanes() {
        let options = UpdateOptions::default()
            .with_view_transition(true)
            .with_flush_sync(true);
        let lanes = Lanes::for_update(TaskPriority::Background, &options, false);
        assert!(lanes.contains(Lanes::VIEW_TRANSITION | Lanes::SYNC | Lanes::BACKGROUND));
        assert_eq!(lanes.priority(), Some(TaskPriority::Background));
    }

    #[test]
    fn priorities_order_by_urgency() {
        assert!(TaskPriority::UserBlocking < TaskPriority::UserVisible);
        assert!(TaskPriority::UserVisible < TaskPriority::Background);
        assert_eq!(
            (Lanes::USER_VISIBLE | Lanes::USER_BLOCKING).priority(),
            Some(TaskPriority::UserBlocking)
        );
        assert_eq!(Lanes::DEFAULT.priority(), None);
    }
}
