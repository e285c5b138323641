// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scheduled tasks and the handles returned to callers.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use futures_channel::oneshot;
use futures_util::FutureExt as _;

use crate::coroutine::Coroutine;
use crate::error::RenderError;
use crate::lane::Lanes;

/// Outcome of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskStatus {
    /// The task did not render on its own behalf.
    pub canceled: bool,
    /// The task reached the end of its frame.
    pub done: bool,
}

impl TaskStatus {
    /// Accepted into a frame that is still running.
    pub const ACCEPTED: Self = Self {
        canceled: false,
        done: false,
    };
    /// Rendered and committed.
    pub const DONE: Self = Self {
        canceled: false,
        done: true,
    };
    /// Superseded by another task or merged into one.
    pub const CANCELED: Self = Self {
        canceled: true,
        done: true,
    };
    /// Interrupted by an error boundary.
    pub const ABORTED: Self = Self {
        canceled: true,
        done: false,
    };
}

pub(crate) type FinishedResult = Result<TaskStatus, RenderError>;

/// Resolves when a task is accepted into a frame.
pub struct Scheduled(oneshot::Receiver<TaskStatus>);

impl fmt::Debug for Scheduled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Scheduled").finish()
    }
}

impl Future for Scheduled {
    type Output = TaskStatus;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A dropped sender means the runtime went away before the frame ran.
        self.0
            .poll_unpin(cx)
            .map(|r| r.unwrap_or(TaskStatus::CANCELED))
    }
}

/// Resolves when a task's frame has committed, was canceled, or failed.
pub struct Finished(oneshot::Receiver<FinishedResult>);

impl fmt::Debug for Finished {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Finished").finish()
    }
}

impl Future for Finished {
    type Output = FinishedResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.0
            .poll_unpin(cx)
            .map(|r| r.unwrap_or(Ok(TaskStatus::CANCELED)))
    }
}

/// The two awaitables returned by
/// [`Runtime::schedule_update`](crate::Runtime::schedule_update).
#[derive(Debug)]
pub struct UpdateHandle {
    /// Resolves once the task is accepted into a frame.
    pub scheduled: Scheduled,
    /// Resolves once the task's frame completes.
    pub finished: Finished,
}

impl UpdateHandle {
    /// A handle whose task never ran, such as an update requested for a
    /// component that is gone.
    #[must_use]
    pub fn canceled() -> Self {
        let (scheduled_tx, scheduled) = oneshot::channel();
        let (finished_tx, finished) = oneshot::channel();
        let _ = scheduled_tx.send(TaskStatus::CANCELED);
        let _ = finished_tx.send(Ok(TaskStatus::CANCELED));
        Self {
            scheduled: Scheduled(scheduled),
            finished: Finished(finished),
        }
    }
}

/// One pending scheduling request.
pub(crate) struct Task {
    pub(crate) id: u64,
    pub(crate) coroutine: Rc<dyn Coroutine>,
    pub(crate) lanes: Lanes,
    scheduled: Vec<oneshot::Sender<TaskStatus>>,
    finished: oneshot::Sender<FinishedResult>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("lanes", &self.lanes)
            .finish_non_exhaustive()
    }
}

impl Task {
    pub(crate) fn new(id: u64, coroutine: Rc<dyn Coroutine>, lanes: Lanes) -> (Self, UpdateHandle) {
        let (scheduled_tx, scheduled) = oneshot::channel();
        let (finished_tx, finished) = oneshot::channel();
        let task = Self {
            id,
            coroutine,
            lanes,
            scheduled: alloc::vec![scheduled_tx],
            finished: finished_tx,
        };
        let handle = UpdateHandle {
            scheduled: Scheduled(scheduled),
            finished: Finished(finished),
        };
        (task, handle)
    }

    /// Creates a handle for a request that was folded into this task.
    ///
    /// Its `scheduled` follows this task; its `finished` reports
    /// [`TaskStatus::CANCELED`] right away.
    pub(crate) fn duplicate(&mut self) -> UpdateHandle {
        let (scheduled_tx, scheduled) = oneshot::channel();
        let (finished_tx, finished) = oneshot::channel();
        self.scheduled.push(scheduled_tx);
        let _ = finished_tx.send(Ok(TaskStatus::CANCELED));
        UpdateHandle {
            scheduled: Scheduled(scheduled),
            finished: Finished(finished),
        }
    }

    pub(crate) fn same_coroutine(&self, coroutine: &Rc<dyn Coroutine>) -> bool {
        core::ptr::addr_eq(Rc::as_ptr(&self.coroutine), Rc::as_ptr(coroutine))
    }

    /// Resolves `scheduled` and returns the sender for `finished`.
    pub(crate) fn accept(self, status: TaskStatus) -> oneshot::Sender<FinishedResult> {
        for tx in self.scheduled {
            let _ = tx.send(status);
        }
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt as _;

    #[test]
    fn canceled_handle_resolves_immediately() {
        let handle = UpdateHandle::canceled();
        assert_eq!(handle.scheduled.now_or_never(), Some(TaskStatus::CANCELED));
        assert_eq!(
            handle.finished.now_or_never().map(|r| r.ok()),
            Some(Some(TaskStatus::CANCELED))
        );
    }

    #[test]
    fn dropped_sender_reads_as_canceled() {
        let (tx, rx) = oneshot::channel::<FinishedResult>();
        drop(tx);
        let status = Finished(rx).now_or_never().map(|r| r.ok());
        assert_eq!(status, Some(Some(TaskStatus::CANCELED)));
    }
}
