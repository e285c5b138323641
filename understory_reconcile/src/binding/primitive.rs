// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::vec::Vec;

use super::{Binding, BindingStatus, BindingType, Lifecycle, mismatch};
use crate::backend::PrimitiveType;
use crate::context::UpdateContext;
use crate::error::BindError;
use crate::host::{HostTree, NodeId};
use crate::part::Part;
use crate::value::Value;

/// Attribute, property, event, text and node bindings.
///
/// They differ only in how the value reaches the host, so they share one
/// memo and one commit path.
pub(super) struct PrimitiveBinding {
    ty: PrimitiveType,
    value: Value,
    committed: Value,
    /// The text node rendered at a child position.
    text: Option<NodeId>,
}

impl PrimitiveBinding {
    pub(super) fn new(ty: PrimitiveType, value: Value) -> Self {
        Self {
            ty,
            value,
            committed: Value::Null,
            text: None,
        }
    }

    pub(super) fn binding_type(&self) -> BindingType {
        match self.ty {
            PrimitiveType::Attribute => BindingType::Attribute,
            PrimitiveType::Property => BindingType::Property,
            PrimitiveType::Event => BindingType::Event,
            PrimitiveType::Node => BindingType::Node,
            PrimitiveType::Text => BindingType::Text,
        }
    }

    pub(super) fn accepts(&self, value: &Value) -> bool {
        match self.ty {
            PrimitiveType::Event => matches!(value, Value::Listener(_) | Value::Null),
            _ => !value.kind().is_directive() && !matches!(value, Value::Spread(_)),
        }
    }

    pub(super) fn connect(
        &mut self,
        this: &Rc<Binding>,
        life: &mut Lifecycle,
        ctx: &mut UpdateContext<'_>,
    ) {
        life.request_mount(this, ctx);
    }

    pub(super) fn bind(
        &mut self,
        value: Value,
        this: &Rc<Binding>,
        life: &mut Lifecycle,
        ctx: &mut UpdateContext<'_>,
    ) -> Result<(), BindError> {
        if !self.accepts(&value) {
            return Err(mismatch(self.binding_type(), &value));
        }
        if value.is_same(&self.value) && life.status() != BindingStatus::Unmounting {
            return Ok(());
        }
        self.value = value;
        life.request_mount(this, ctx);
        Ok(())
    }

    pub(super) fn unbind(
        &mut self,
        this: &Rc<Binding>,
        life: &mut Lifecycle,
        ctx: &mut UpdateContext<'_>,
    ) {
        self.value = Value::Null;
        let has_committed = !self.committed.is_null() || self.text.is_some();
        life.request_unmount(this, has_committed, ctx);
    }

    pub(super) fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        if let Some(text) = self.text {
            out.push(text);
        }
    }

    pub(super) fn mount(&mut self, host: &dyn HostTree, part: &Part) {
        let node = part.node();
        let name = part.name().unwrap_or_default();
        match self.ty {
            PrimitiveType::Attribute => {
                host.set_attribute(node, name, self.value.to_attribute().as_deref());
            }
            PrimitiveType::Property => host.set_property(node, name, &self.value),
            PrimitiveType::Event => {
                let listener = match &self.value {
                    Value::Listener(listener) => Some(listener),
                    _ => None,
                };
                host.set_event_listener(node, name, listener);
            }
            PrimitiveType::Text => {
                host.set_text(node, self.value.to_text().as_deref().unwrap_or_default());
            }
            PrimitiveType::Node => match (self.value.to_text(), self.text) {
                (Some(text), Some(existing)) => host.set_text(existing, &text),
                (Some(text), None) => {
                    let created = host.create_text(&text);
                    host.insert_before(created, node);
                    self.text = Some(created);
                }
                (None, _) => {
                    if let Some(existing) = self.text.take() {
                        host.remove(existing);
                    }
                }
            },
        }
        self.committed = self.value.clone();
    }

    pub(super) fn unmount(&mut self, host: &dyn HostTree, part: &Part) {
        let node = part.node();
        let name = part.name().unwrap_or_default();
        match self.ty {
            PrimitiveType::Attribute => host.set_attribute(node, name, None),
            PrimitiveType::Property => host.set_property(node, name, &Value::Null),
            PrimitiveType::Event => host.set_event_listener(node, name, None),
            PrimitiveType::Text => host.set_text(node, ""),
            PrimitiveType::Node => {
                if let Some(existing) = self.text.take() {
                    host.remove(existing);
                }
            }
        }
        self.committed = Value::Null;
    }
}
