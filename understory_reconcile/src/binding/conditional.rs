// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::vec::Vec;

use super::{Binding, BindingType, mismatch};
use crate::context::UpdateContext;
use crate::error::BindError;
use crate::host::NodeId;
use crate::part::Part;
use crate::slot::Slot;
use crate::value::{Branch, ConditionalValue, Value};

/// One side of a conditional, built the first time it is shown.
struct BranchState {
    factory: Branch,
    value: Value,
    slot: Slot,
}

/// Switches between two branches that share one anchor.
///
/// Each branch is memoized by the identity of its factory, so flipping back
/// and forth rebinds the existing slot instead of rebuilding it.
pub(super) struct ConditionalBinding {
    value: Option<Rc<ConditionalValue>>,
    condition: bool,
    /// Indexed by `condition as usize`.
    branches: [Option<BranchState>; 2],
    unbound: bool,
}

impl ConditionalBinding {
    pub(super) fn new(value: Rc<ConditionalValue>) -> Self {
        Self {
            condition: value.condition(),
            value: Some(value),
            branches: [None, None],
            unbound: false,
        }
    }

    pub(super) fn connect(
        &mut self,
        this: &Rc<Binding>,
        ctx: &mut UpdateContext<'_>,
    ) -> Result<(), BindError> {
        let Some(value) = self.value.clone() else {
            return Ok(());
        };
        let side = value.condition();
        self.activate(side, value.branch(side), true, this.part(), ctx)?;
        self.condition = side;
        Ok(())
    }

    pub(super) fn bind(
        &mut self,
        value: Value,
        this: &Rc<Binding>,
        ctx: &mut UpdateContext<'_>,
    ) -> Result<(), BindError> {
        let Value::Conditional(value) = value else {
            return Err(mismatch(BindingType::Conditional, &value));
        };
        let same = self.value.as_ref().is_some_and(|v| Rc::ptr_eq(v, &value));
        if same && !self.unbound {
            return Ok(());
        }
        let side = value.condition();
        let flipped = side != self.condition;
        self.activate(side, value.branch(side), flipped || self.unbound, this.part(), ctx)?;
        if flipped && !self.unbound {
            if let Some(old) = &self.branches[usize::from(self.condition)] {
                old.slot.unbind(ctx);
            }
        }
        self.condition = side;
        self.value = Some(value);
        self.unbound = false;
        Ok(())
    }

    /// Shows the branch for `side`.
    ///
    /// `reactivate` rebinds an existing branch even when its factory did not
    /// change, which is needed after it was unbound.
    fn activate(
        &mut self,
        side: bool,
        factory: &Branch,
        reactivate: bool,
        part: &Part,
        ctx: &mut UpdateContext<'_>,
    ) -> Result<(), BindError> {
        match &mut self.branches[usize::from(side)] {
            Some(branch) if !Rc::ptr_eq(&branch.factory, factory) => {
                branch.factory = factory.clone();
                branch.value = factory();
                branch.slot.reconcile(branch.value.clone(), ctx)
            }
            Some(branch) => {
                if reactivate {
                    branch.slot.reconcile(branch.value.clone(), ctx)?;
                }
                Ok(())
            }
            empty @ None => {
                let value = factory();
                let slot = ctx.resolve_slot(value.clone(), part.clone())?;
                slot.connect(ctx)?;
                *empty = Some(BranchState {
                    factory: factory.clone(),
                    value,
                    slot,
                });
                Ok(())
            }
        }
    }

    pub(super) fn unbind(&mut self, ctx: &mut UpdateContext<'_>) {
        if !self.unbound {
            if let Some(active) = &self.branches[usize::from(self.condition)] {
                active.slot.unbind(ctx);
            }
        }
        self.value = None;
        self.unbound = true;
    }

    pub(super) fn disconnect(&mut self, ctx: &mut UpdateContext<'_>) {
        for branch in self.branches.iter().flatten() {
            branch.slot.disconnect(ctx);
        }
    }

    pub(super) fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        for branch in self.branches.iter().flatten() {
            branch.slot.collect_nodes(out);
        }
    }
}
