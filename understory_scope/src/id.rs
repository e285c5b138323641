// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scope identifiers.

use core::fmt;

/// Identifier for a scope in a [`ScopeTree`](crate::ScopeTree).
///
/// This is a small, copyable handle made of a slot index and a generation
/// counter.
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `ScopeId` for that slot is stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new,
///   distinct `ScopeId`.
///
/// Use [`ScopeTree::is_alive`](crate::ScopeTree::is_alive) to check liveness.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct ScopeId(pub(crate) u32, pub(crate) u32);

impl ScopeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Returns the generation of this identifier.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.1
    }
}

impl fmt::Debug for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopeId({}v{})", self.0, self.1)
    }
}
