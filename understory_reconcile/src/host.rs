// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host tree contract.
//!
//! Bindings never hold host nodes directly; they hold [`NodeId`]s handed out
//! by a [`HostTree`] and call back into it when they commit. All methods take
//! `&self` because commits happen while the runtime is shared; hosts use
//! interior mutability.

mod memory;

pub use memory::{HostOp, MemoryHost};

use core::fmt;

use crate::template::TemplateMode;
use crate::value::{Listener, Value};

/// Opaque handle to a host node.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Wraps a host-defined raw handle.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw handle.
    #[must_use]
    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// A retained tree of host nodes.
///
/// Structural operations follow sibling semantics: content bound at a child
/// position is inserted *before* an anchor node, so an anchor always trails
/// the content it owns.
pub trait HostTree {
    /// Creates a detached element.
    fn create_element(&self, tag: &str, mode: TemplateMode) -> NodeId;

    /// Creates a detached text node.
    fn create_text(&self, text: &str) -> NodeId;

    /// Creates a detached comment node, used as a position marker.
    fn create_comment(&self, data: &str) -> NodeId;

    /// Appends `child` as the last child of `parent`, detaching it first.
    fn append_child(&self, parent: NodeId, child: NodeId);

    /// Moves `node` so that it immediately precedes `reference`.
    ///
    /// If `reference` has no parent, `node` ends up detached.
    fn insert_before(&self, node: NodeId, reference: NodeId);

    /// Detaches `node` from its parent. Detached nodes are left alone.
    fn remove(&self, node: NodeId);

    /// Returns the parent of `node`.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Returns the sibling before `node`.
    fn previous_sibling(&self, node: NodeId) -> Option<NodeId>;

    /// Returns the sibling after `node`.
    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    /// Sets an attribute, or removes it when `value` is `None`.
    fn set_attribute(&self, node: NodeId, name: &str, value: Option<&str>);

    /// Sets a property. [`Value::Null`] clears it.
    fn set_property(&self, node: NodeId, name: &str, value: &Value);

    /// Installs an event listener, or removes it when `listener` is `None`.
    fn set_event_listener(&self, node: NodeId, name: &str, listener: Option<&Listener>);

    /// Replaces the content of a text node.
    fn set_text(&self, node: NodeId, text: &str);
}
