// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-tree attachment points.

use alloc::rc::Rc;
use core::fmt;

use crate::host::NodeId;

/// One location in the host tree that a binding writes to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Part {
    /// A named attribute on an element.
    Attribute {
        /// The element.
        node: NodeId,
        /// Attribute name.
        name: Rc<str>,
    },
    /// A named property on an element.
    Property {
        /// The element.
        node: NodeId,
        /// Property name.
        name: Rc<str>,
    },
    /// A named event on an element.
    Event {
        /// The element.
        node: NodeId,
        /// Event name.
        name: Rc<str>,
    },
    /// An element as a whole, targeted by spreads.
    Element {
        /// The element.
        node: NodeId,
    },
    /// A child position. Content is inserted before `anchor`.
    ChildNode {
        /// Marker node trailing the content.
        anchor: NodeId,
    },
    /// The content of a text node.
    Text {
        /// The text node.
        node: NodeId,
    },
}

/// Discriminant of a [`Part`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PartKind {
    /// [`Part::Attribute`].
    Attribute,
    /// [`Part::Property`].
    Property,
    /// [`Part::Event`].
    Event,
    /// [`Part::Element`].
    Element,
    /// [`Part::ChildNode`].
    ChildNode,
    /// [`Part::Text`].
    Text,
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Attribute => "attribute",
            Self::Property => "property",
            Self::Event => "event",
            Self::Element => "element",
            Self::ChildNode => "child node",
            Self::Text => "text",
        })
    }
}

impl Part {
    /// Returns the discriminant.
    #[must_use]
    pub fn kind(&self) -> PartKind {
        match self {
            Self::Attribute { .. } => PartKind::Attribute,
            Self::Property { .. } => PartKind::Property,
            Self::Event { .. } => PartKind::Event,
            Self::Element { .. } => PartKind::Element,
            Self::ChildNode { .. } => PartKind::ChildNode,
            Self::Text { .. } => PartKind::Text,
        }
    }

    /// Returns the node this part writes to, or the anchor for child positions.
    #[must_use]
    pub fn node(&self) -> NodeId {
        match self {
            Self::Attribute { node, .. }
            | Self::Property { node, .. }
            | Self::Event { node, .. }
            | Self::Element { node }
            | Self::Text { node } => *node,
            Self::ChildNode { anchor } => *anchor,
        }
    }

    /// Returns the attribute, property or event name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Attribute { name, .. } | Self::Property { name, .. } | Self::Event { name, .. } => {
                Some(name)
            }
            _ => None,
        }
    }
}
