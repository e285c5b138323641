// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::vec::Vec;

use super::{Binding, BindingType, mismatch};
use crate::component::{ComponentElement, ComponentInstance};
use crate::context::UpdateContext;
use crate::error::BindError;
use crate::host::NodeId;
use crate::value::Value;

/// Hosts a [`ComponentInstance`] at a child position.
///
/// The binding itself never touches the host: the instance renders into a
/// child slot of its own when it is resumed as a coroutine.
pub(super) struct ComponentBinding {
    element: ComponentElement,
    instance: Option<Rc<ComponentInstance>>,
    unbound: bool,
}

impl ComponentBinding {
    pub(super) fn new(element: ComponentElement) -> Self {
        Self {
            element,
            instance: None,
            unbound: false,
        }
    }

    pub(super) fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Component(e) if e.component_type() == self.element.component_type())
    }

    pub(super) fn connect(&mut self, this: &Rc<Binding>, ctx: &mut UpdateContext<'_>) {
        let instance = ComponentInstance::new(self.element.clone(), this.part().clone(), ctx);
        instance.request_render(ctx);
        self.instance = Some(instance);
    }

    pub(super) fn bind(&mut self, value: Value, ctx: &mut UpdateContext<'_>) -> Result<(), BindError> {
        if !self.accepts(&value) {
            return Err(mismatch(BindingType::Component, &value));
        }
        let Value::Component(element) = value else {
            return Err(mismatch(BindingType::Component, &value));
        };
        if element.ptr_eq(&self.element) && !self.unbound {
            return Ok(());
        }
        let rerender = self.unbound || element.should_update(&self.element);
        self.element = element.clone();
        self.unbound = false;
        if let Some(instance) = &self.instance {
            instance.set_element(element);
            if rerender {
                instance.request_render(ctx);
            }
        }
        Ok(())
    }

    pub(super) fn unbind(&mut self, ctx: &mut UpdateContext<'_>) {
        if self.unbound {
            return;
        }
        self.unbound = true;
        if let Some(instance) = &self.instance {
            instance.unbind(ctx);
        }
    }

    pub(super) fn disconnect(&mut self, ctx: &mut UpdateContext<'_>) {
        if let Some(instance) = self.instance.take() {
            instance.disconnect(ctx);
        }
    }

    pub(super) fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        if let Some(instance) = &self.instance {
            instance.collect_nodes(out);
        }
    }
}
