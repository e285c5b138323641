// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resumable units of render work.

use understory_scope::ScopeId;

use crate::context::UpdateContext;
use crate::error::BoxError;
use crate::lane::Lanes;

/// A unit of render work that the runtime resumes during a frame.
///
/// A coroutine is resumed once per render pass while its pending lanes
/// intersect the frame's lanes. Resuming never suspends; work that must wait
/// is expressed by scheduling another update. State that outlives one resume
/// lives in the coroutine itself.
pub trait Coroutine {
    /// Scope used for context lookup and error boundaries.
    fn scope(&self) -> Option<ScopeId>;

    /// Lanes this coroutine still has work for.
    fn pending_lanes(&self) -> Lanes;

    /// Adds lanes that need work. Called when an update is scheduled.
    fn add_pending_lanes(&self, lanes: Lanes);

    /// Runs the coroutine.
    ///
    /// Implementations clear the lanes they handled; the runtime skips a
    /// coroutine whose pending lanes no longer intersect the frame.
    fn resume(&self, ctx: &mut UpdateContext<'_>) -> Result<(), BoxError>;
}
