// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::vec::Vec;

use super::{Binding, BindingStatus, BindingType, Lifecycle, mismatch};
use crate::context::UpdateContext;
use crate::error::BindError;
use crate::host::{HostTree, NodeId};
use crate::part::Part;
use crate::value::{SpreadValue, Value};

/// Binds a [`SpreadValue`] to an element, diffing entries by name.
pub(super) struct SpreadBinding {
    value: Option<Rc<SpreadValue>>,
    committed: Vec<(Rc<str>, Value)>,
}

impl SpreadBinding {
    pub(super) fn new(value: Rc<SpreadValue>) -> Self {
        Self {
            value: Some(value),
            committed: Vec::new(),
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
        let Value::Spread(value) = value else {
            return Err(mismatch(BindingType::Spread, &value));
        };
        let same = self.value.as_ref().is_some_and(|v| Rc::ptr_eq(v, &value));
        if same && life.status() != BindingStatus::Unmounting {
            return Ok(());
        }
        self.value = Some(value);
        life.request_mount(this, ctx);
        Ok(())
    }

    pub(super) fn unbind(
        &mut self,
        this: &Rc<Binding>,
        life: &mut Lifecycle,
        ctx: &mut UpdateContext<'_>,
    ) {
        self.value = None;
        life.request_unmount(this, !self.committed.is_empty(), ctx);
    }

    pub(super) fn mount(&mut self, host: &dyn HostTree, part: &Part) {
        let node = part.node();
        let entries = self.value.as_ref().map_or(&[][..], |v| v.entries());
        for (name, _) in &self.committed {
            if !entries.iter().any(|(n, _)| n == name) {
                write_entry(host, node, name, &Value::Null);
            }
        }
        for (name, value) in entries {
            let unchanged = self
                .committed
                .iter()
                .find(|(n, _)| n == name)
                .is_some_and(|(_, old)| old.is_same(value));
            if !unchanged {
                write_entry(host, node, name, value);
            }
        }
        self.committed = entries.to_vec();
    }

    pub(super) fn unmount(&mut self, host: &dyn HostTree, part: &Part) {
        for (name, _) in self.committed.drain(..) {
            write_entry(host, part.node(), &name, &Value::Null);
        }
    }
}

/// `.name` is a property, `@name` an event and anything else an attribute.
fn write_entry(host: &dyn HostTree, node: NodeId, name: &str, value: &Value) {
    if let Some(property) = name.strip_prefix('.') {
        host.set_property(node, property, value);
    } else if let Some(event) = name.strip_prefix('@') {
        let listener = match value {
            Value::Listener(listener) => Some(listener),
            _ => None,
        };
        host.set_event_listener(node, event, listener);
    } else {
        host.set_attribute(node, name, value.to_attribute().as_deref());
    }
}
