// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slots: a binding plus the policy for values it cannot take.

use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::binding::Binding;
use crate::context::UpdateContext;
use crate::error::BindError;
use crate::host::NodeId;
use crate::part::{Part, PartKind};
use crate::value::Value;

/// What a slot does when a value needs a different binding kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SlotType {
    /// Fail with [`BindError::SlotTypeMismatch`].
    #[default]
    Strict,
    /// Tear the old binding down and resolve a new one at the same part.
    Loose,
}

impl SlotType {
    /// Child positions accept any value; every other part is strict.
    #[must_use]
    pub fn for_part(value: &Value, part: &Part) -> Self {
        let _ = value;
        if part.kind() == PartKind::ChildNode {
            Self::Loose
        } else {
            Self::Strict
        }
    }
}

/// A binding held at one template hole.
#[derive(Debug)]
pub struct Slot {
    binding: Rc<Binding>,
    slot_type: SlotType,
}

impl Slot {
    /// Wraps a resolved binding.
    #[must_use]
    pub fn new(binding: Rc<Binding>, slot_type: SlotType) -> Self {
        Self { binding, slot_type }
    }

    /// The current binding.
    #[must_use]
    pub fn binding(&self) -> &Rc<Binding> {
        &self.binding
    }

    /// The mismatch policy.
    #[must_use]
    pub fn slot_type(&self) -> SlotType {
        self.slot_type
    }

    /// Connects the current binding.
    pub fn connect(&self, ctx: &mut UpdateContext<'_>) -> Result<(), BindError> {
        self.binding.connect(ctx)
    }

    /// Binds `value`, replacing the binding if the policy allows it.
    pub fn reconcile(&mut self, value: Value, ctx: &mut UpdateContext<'_>) -> Result<(), BindError> {
        if self.binding.accepts(&value) {
            return self.binding.bind(value, ctx);
        }
        match self.slot_type {
            SlotType::Strict => Err(BindError::SlotTypeMismatch {
                expected: self.binding.binding_type(),
                actual: value.kind(),
            }),
            SlotType::Loose => {
                let next = ctx.resolve_binding(value, self.binding.part().clone())?;
                self.binding.unbind(ctx);
                self.binding.disconnect(ctx);
                next.connect(ctx)?;
                self.binding = next;
                Ok(())
            }
        }
    }

    /// Unbinds the current binding.
    pub fn unbind(&self, ctx: &mut UpdateContext<'_>) {
        self.binding.unbind(ctx);
    }

    /// Disconnects the current binding.
    pub fn disconnect(&self, ctx: &mut UpdateContext<'_>) {
        self.binding.disconnect(ctx);
    }

    /// Appends the host nodes owned by the current binding.
    pub fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        self.binding.collect_nodes(out);
    }
}
