// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory host tree.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::any::Any;
use core::cell::RefCell;
use core::fmt::{self, Write as _};

use super::{HostTree, NodeId};
use crate::template::TemplateMode;
use crate::value::{Listener, Value};

/// A host operation recorded by [`MemoryHost`].
#[derive(Clone, Debug, PartialEq)]
pub enum HostOp {
    /// An element was created.
    CreateElement(NodeId, String),
    /// A text node was created.
    CreateText(NodeId, String),
    /// A comment was created.
    CreateComment(NodeId),
    /// A node was attached under `parent`.
    Insert {
        /// The attached node.
        node: NodeId,
        /// Its new parent.
        parent: NodeId,
    },
    /// A node was detached.
    Remove(NodeId),
    /// An attribute was set or removed.
    SetAttribute {
        /// Target element.
        node: NodeId,
        /// Attribute name.
        name: String,
        /// New value, `None` when removed.
        value: Option<String>,
    },
    /// A property was written.
    SetProperty {
        /// Target element.
        node: NodeId,
        /// Property name.
        name: String,
    },
    /// A listener was installed or removed.
    SetEventListener {
        /// Target element.
        node: NodeId,
        /// Event name.
        name: String,
        /// Whether a listener is now installed.
        installed: bool,
    },
    /// Text content changed.
    SetText(NodeId, String),
}

enum NodeData {
    Element {
        tag: String,
        mode: TemplateMode,
        attributes: Vec<(String, String)>,
        properties: Vec<(String, Value)>,
        listeners: Vec<(String, Listener)>,
    },
    Text(String),
    Comment(String),
}

struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Default)]
struct Inner {
    nodes: Vec<Node>,
    ops: Vec<HostOp>,
}

impl Inner {
    fn create(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::from_raw(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.to_raw() as usize)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.to_raw() as usize)
    }

    /// Detaches `id` and returns its former parent.
    fn detach(&mut self, id: NodeId) -> Option<NodeId> {
        let parent = self.node_mut(id)?.parent.take()?;
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        Some(parent)
    }

    fn siblings(&self, id: NodeId) -> Option<(&[NodeId], usize)> {
        let parent = self.node(id)?.parent?;
        let children = &self.node(parent)?.children;
        let pos = children.iter().position(|c| *c == id)?;
        Some((children, pos))
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.node_mut(id)
            .map(|n| &mut n.data)
            .filter(|d| matches!(d, NodeData::Element { .. }))
    }

    fn write_html(&self, id: NodeId, out: &mut String) -> fmt::Result {
        let Some(node) = self.node(id) else {
            return Ok(());
        };
        match &node.data {
            NodeData::Element {
                tag, attributes, ..
            } => {
                write!(out, "<{tag}")?;
                for (name, value) in attributes {
                    if value.is_empty() {
                        write!(out, " {name}")?;
                    } else {
                        write!(out, " {name}=\"{}\"", Escaped(value))?;
                    }
                }
                out.push('>');
                for child in &node.children {
                    self.write_html(*child, out)?;
                }
                write!(out, "</{tag}>")
            }
            NodeData::Text(text) => write!(out, "{}", Escaped(text)),
            NodeData::Comment(_) => Ok(()),
        }
    }
}

struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '&' => f.write_str("&amp;")?,
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '"' => f.write_str("&quot;")?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

/// A [`HostTree`] stored in memory.
///
/// Useful for headless rendering and tests: every mutation is recorded as a
/// [`HostOp`], and subtrees can be serialized to HTML. Comments are used as
/// anchors and are left out of the serialized output.
#[derive(Default)]
pub struct MemoryHost {
    inner: RefCell<Inner>,
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("MemoryHost")
            .field("nodes", &inner.nodes.len())
            .field("ops", &inner.ops.len())
            .finish()
    }
}

impl MemoryHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded operations.
    #[must_use]
    pub fn ops(&self) -> Vec<HostOp> {
        self.inner.borrow().ops.clone()
    }

    /// Returns and clears the recorded operations.
    pub fn take_ops(&self) -> Vec<HostOp> {
        core::mem::take(&mut self.inner.borrow_mut().ops)
    }

    /// Serializes the children of `node`.
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        let inner = self.inner.borrow();
        let mut out = String::new();
        if let Some(n) = inner.node(node) {
            for child in &n.children {
                // Writing into a `String` cannot fail.
                let _ = inner.write_html(*child, &mut out);
            }
        }
        out
    }

    /// Serializes `node` itself.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        let _ = self.inner.borrow().write_html(node, &mut out);
        out
    }

    /// Returns the children of `node`.
    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Returns the tag of an element.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<String> {
        match &self.inner.borrow().node(node)?.data {
            NodeData::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    /// Returns the namespace mode an element was created with.
    #[must_use]
    pub fn mode(&self, node: NodeId) -> Option<TemplateMode> {
        match &self.inner.borrow().node(node)?.data {
            NodeData::Element { mode, .. } => Some(*mode),
            _ => None,
        }
    }

    /// Returns the text of a text or comment node.
    #[must_use]
    pub fn text(&self, node: NodeId) -> Option<String> {
        match &self.inner.borrow().node(node)?.data {
            NodeData::Text(text) | NodeData::Comment(text) => Some(text.clone()),
            NodeData::Element { .. } => None,
        }
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.inner.borrow().node(node)?.data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    /// Returns a property value.
    #[must_use]
    pub fn property(&self, node: NodeId, name: &str) -> Option<Value> {
        match &self.inner.borrow().node(node)?.data {
            NodeData::Element { properties, .. } => properties
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    /// Invokes the listener for `name` on `node`, if any.
    ///
    /// Returns `true` if a listener ran.
    pub fn dispatch_event(&self, node: NodeId, name: &str, payload: &dyn Any) -> bool {
        let listener = match self.inner.borrow().node(node).map(|n| &n.data) {
            Some(NodeData::Element { listeners, .. }) => listeners
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, l)| l.clone()),
            _ => None,
        };
        // Listeners may schedule updates that touch the host again.
        match listener {
            Some(listener) => {
                listener.call(payload);
                true
            }
            None => false,
        }
    }
}

impl HostTree for MemoryHost {
    fn create_element(&self, tag: &str, mode: TemplateMode) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.create(NodeData::Element {
            tag: tag.to_string(),
            mode,
            attributes: Vec::new(),
            properties: Vec::new(),
            listeners: Vec::new(),
        });
        inner.ops.push(HostOp::CreateElement(id, tag.to_string()));
        id
    }

    fn create_text(&self, text: &str) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.create(NodeData::Text(text.to_string()));
        inner.ops.push(HostOp::CreateText(id, text.to_string()));
        id
    }

    fn create_comment(&self, data: &str) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        let id = inner.create(NodeData::Comment(data.to_string()));
        inner.ops.push(HostOp::CreateComment(id));
        id
    }

    fn append_child(&self, parent: NodeId, child: NodeId) {
        let mut inner = self.inner.borrow_mut();
        if inner.node(parent).is_none() || inner.node(child).is_none() {
            return;
        }
        inner.detach(child);
        if let Some(p) = inner.node_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = inner.node_mut(child) {
            c.parent = Some(parent);
        }
        inner.ops.push(HostOp::Insert {
            node: child,
            parent,
        });
    }

    fn insert_before(&self, node: NodeId, reference: NodeId) {
        let mut inner = self.inner.borrow_mut();
        if node == reference || inner.node(node).is_none() {
            return;
        }
        inner.detach(node);
        let Some(parent) = inner.node(reference).and_then(|r| r.parent) else {
            return;
        };
        let Some(p) = inner.node_mut(parent) else {
            return;
        };
        let pos = p
            .children
            .iter()
            .position(|c| *c == reference)
            .unwrap_or(p.children.len());
        p.children.insert(pos, node);
        if let Some(n) = inner.node_mut(node) {
            n.parent = Some(parent);
        }
        inner.ops.push(HostOp::Insert { node, parent });
    }

    fn remove(&self, node: NodeId) {
        let mut inner = self.inner.borrow_mut();
        if inner.detach(node).is_some() {
            inner.ops.push(HostOp::Remove(node));
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.borrow().node(node)?.parent
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let inner = self.inner.borrow();
        let (siblings, pos) = inner.siblings(node)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let inner = self.inner.borrow();
        let (siblings, pos) = inner.siblings(node)?;
        siblings.get(pos + 1).copied()
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: Option<&str>) {
        let mut inner = self.inner.borrow_mut();
        let Some(NodeData::Element { attributes, .. }) = inner.element_mut(node) else {
            return;
        };
        match value {
            Some(value) => match attributes.iter_mut().find(|(n, _)| n == name) {
                Some(slot) => slot.1 = value.to_string(),
                None => attributes.push((name.to_string(), value.to_string())),
            },
            None => attributes.retain(|(n, _)| n != name),
        }
        inner.ops.push(HostOp::SetAttribute {
            node,
            name: name.to_string(),
            value: value.map(ToString::to_string),
        });
    }

    fn set_property(&self, node: NodeId, name: &str, value: &Value) {
        let mut inner = self.inner.borrow_mut();
        let Some(NodeData::Element { properties, .. }) = inner.element_mut(node) else {
            return;
        };
        if value.is_null() {
            properties.retain(|(n, _)| n != name);
        } else {
            match properties.iter_mut().find(|(n, _)| n == name) {
                Some(slot) => slot.1 = value.clone(),
                None => properties.push((name.to_string(), value.clone())),
            }
        }
        inner.ops.push(HostOp::SetProperty {
            node,
            name: name.to_string(),
        });
    }

    fn set_event_listener(&self, node: NodeId, name: &str, listener: Option<&Listener>) {
        let mut inner = self.inner.borrow_mut();
        let Some(NodeData::Element { listeners, .. }) = inner.element_mut(node) else {
            return;
        };
        listeners.retain(|(n, _)| n != name);
        if let Some(listener) = listener {
            listeners.push((name.to_string(), listener.clone()));
        }
        inner.ops.push(HostOp::SetEventListener {
            node,
            name: name.to_string(),
            installed: listener.is_some(),
        });
    }

    fn set_text(&self, node: NodeId, text: &str) {
        let mut inner = self.inner.borrow_mut();
        let Some(n) = inner.node_mut(node) else {
            return;
        };
        match &mut n.data {
            NodeData::Text(t) | NodeData::Comment(t) => {
                t.clear();
                t.push_str(text);
            }
            NodeData::Element { .. } => return,
        }
        inner.ops.push(HostOp::SetText(node, text.to_string()));
    }
}
