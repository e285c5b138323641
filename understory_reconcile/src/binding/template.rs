// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use super::{Binding, BindingStatus, BindingType, Lifecycle, mismatch};
use crate::context::UpdateContext;
use crate::error::BindError;
use crate::host::{HostTree, NodeId};
use crate::part::Part;
use crate::slot::Slot;
use crate::template::{Template, TemplateResult, TemplateSource};
use crate::value::Value;

/// A rendered instance of a [`Template`]: detached host nodes plus one slot
/// per hole.
///
/// Child holes at the top level use a root node as their anchor, so the
/// content bound there is part of the fragment too; [`Fragment::collect_nodes`]
/// accounts for it.
pub struct Fragment {
    template: Rc<Template>,
    roots: Vec<NodeId>,
    slots: RefCell<Vec<Slot>>,
    mounted: Cell<bool>,
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("roots", &self.roots)
            .field("mounted", &self.mounted.get())
            .finish_non_exhaustive()
    }
}

impl Fragment {
    /// Instantiates `template` and connects a slot for every hole.
    pub fn render(
        template: Rc<Template>,
        values: &[Value],
        ctx: &mut UpdateContext<'_>,
    ) -> Result<Rc<Self>, BindError> {
        check_holes(&template, values)?;
        let (roots, parts) = template.instantiate(ctx.host());
        let mut slots: Vec<Slot> = Vec::with_capacity(parts.len());
        for (part, value) in parts.into_iter().zip(values.iter().cloned()) {
            let connected = ctx
                .resolve_slot(value, part)
                .and_then(|slot| slot.connect(ctx).map(|()| slot));
            match connected {
                Ok(slot) => slots.push(slot),
                Err(error) => {
                    for slot in &slots {
                        slot.disconnect(ctx);
                    }
                    return Err(error);
                }
            }
        }
        Ok(Rc::new(Self {
            template,
            roots,
            slots: RefCell::new(slots),
            mounted: Cell::new(false),
        }))
    }

    /// The template this fragment was built from.
    #[must_use]
    pub fn template(&self) -> &Rc<Template> {
        &self.template
    }

    /// The top-level host nodes.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Returns `true` while the fragment is in the host tree.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    /// Reconciles every slot with new values.
    pub fn bind(&self, values: &[Value], ctx: &mut UpdateContext<'_>) -> Result<(), BindError> {
        check_holes(&self.template, values)?;
        let mut slots = self.slots.borrow_mut();
        for (slot, value) in slots.iter_mut().zip(values) {
            slot.reconcile(value.clone(), ctx)?;
        }
        Ok(())
    }

    /// Unbinds every slot.
    pub fn unbind(&self, ctx: &mut UpdateContext<'_>) {
        for slot in self.slots.borrow().iter() {
            slot.unbind(ctx);
        }
    }

    /// Disconnects every slot.
    pub fn disconnect(&self, ctx: &mut UpdateContext<'_>) {
        for slot in self.slots.borrow().iter() {
            slot.disconnect(ctx);
        }
    }

    /// Appends the fragment's top-level nodes in document order.
    pub fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        let slots = self.slots.borrow();
        for (i, root) in self.roots.iter().enumerate() {
            if let Some(slot) = self.template.root_hole(i).and_then(|hole| slots.get(hole)) {
                slot.collect_nodes(out);
            }
            out.push(*root);
        }
    }

    pub(crate) fn mount(&self, host: &dyn HostTree, anchor: NodeId) {
        let mut nodes = Vec::new();
        self.collect_nodes(&mut nodes);
        for node in nodes {
            host.insert_before(node, anchor);
        }
        self.mounted.set(true);
    }

    pub(crate) fn unmount(&self, host: &dyn HostTree) {
        let mut nodes = Vec::new();
        self.collect_nodes(&mut nodes);
        for node in nodes {
            host.remove(node);
        }
        self.mounted.set(false);
    }
}

fn check_holes(template: &Template, values: &[Value]) -> Result<(), BindError> {
    let expected = template.holes().len();
    if expected == values.len() {
        Ok(())
    } else {
        Err(BindError::HoleCountMismatch {
            expected,
            actual: values.len(),
        })
    }
}

fn same(a: Option<&Rc<Fragment>>, b: Option<&Rc<Fragment>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

/// Renders a [`TemplateResult`] at a child position.
///
/// `pending` is the fragment the next commit should show and `current` the
/// one the host shows now. They differ after a template switch until the
/// commit swaps them.
pub(super) struct TemplateBinding {
    value: Option<Rc<TemplateResult>>,
    pending: Option<Rc<Fragment>>,
    current: Option<Rc<Fragment>>,
}

impl TemplateBinding {
    pub(super) fn new(value: Rc<TemplateResult>) -> Self {
        Self {
            value: Some(value),
            pending: None,
            current: None,
        }
    }

    pub(super) fn connect(
        &mut self,
        this: &Rc<Binding>,
        life: &mut Lifecycle,
        ctx: &mut UpdateContext<'_>,
    ) -> Result<(), BindError> {
        let Some(value) = self.value.clone() else {
            return Ok(());
        };
        // The parent commits before its children so their anchors are live.
        life.request_mount(this, ctx);
        let template = resolve_template(value.source(), ctx)?;
        self.pending = Some(Fragment::render(template, value.values(), ctx)?);
        Ok(())
    }

    pub(super) fn bind(
        &mut self,
        value: Value,
        this: &Rc<Binding>,
        life: &mut Lifecycle,
        ctx: &mut UpdateContext<'_>,
    ) -> Result<(), BindError> {
        let Value::Template(value) = value else {
            return Err(mismatch(BindingType::Template, &value));
        };
        let same_value = self.value.as_ref().is_some_and(|v| Rc::ptr_eq(v, &value));
        if same_value && life.status() != BindingStatus::Unmounting {
            return Ok(());
        }
        let template = resolve_template(value.source(), ctx)?;
        match self.pending.clone() {
            Some(pending) if Rc::ptr_eq(pending.template(), &template) => {
                let shown = same(self.current.as_ref(), Some(&pending)) && pending.is_mounted();
                if life.status() == BindingStatus::Unmounting || !shown {
                    life.request_mount(this, ctx);
                }
                pending.bind(value.values(), ctx)?;
            }
            _ => {
                life.request_mount(this, ctx);
                let fragment = Fragment::render(template, value.values(), ctx)?;
                if let Some(old) = self.pending.replace(fragment) {
                    if old.is_mounted() {
                        old.unbind(ctx);
                    }
                    old.disconnect(ctx);
                }
            }
        }
        self.value = Some(value);
        Ok(())
    }

    pub(super) fn unbind(
        &mut self,
        this: &Rc<Binding>,
        life: &mut Lifecycle,
        ctx: &mut UpdateContext<'_>,
    ) {
        self.value = None;
        let shown = self.current.as_ref().is_some_and(|c| c.is_mounted());
        life.request_unmount(this, shown, ctx);
        if let Some(pending) = &self.pending {
            pending.unbind(ctx);
        }
    }

    pub(super) fn disconnect(&mut self, ctx: &mut UpdateContext<'_>) {
        // A replaced `current` was disconnected when it was replaced.
        if let Some(pending) = &self.pending {
            pending.disconnect(ctx);
        }
    }

    pub(super) fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        if let Some(current) = self.current.as_ref().filter(|c| c.is_mounted()) {
            current.collect_nodes(out);
        }
    }

    pub(super) fn mount(&mut self, host: &dyn HostTree, part: &Part) {
        if let Some(current) = &self.current {
            if !same(Some(current), self.pending.as_ref()) && current.is_mounted() {
                current.unmount(host);
            }
        }
        if let Some(pending) = &self.pending {
            if !pending.is_mounted() {
                pending.mount(host, part.node());
            }
        }
        self.current = self.pending.clone();
    }

    pub(super) fn unmount(&mut self, host: &dyn HostTree) {
        if let Some(current) = self.current.as_ref().filter(|c| c.is_mounted()) {
            current.unmount(host);
        }
    }
}

fn resolve_template(
    source: &TemplateSource,
    ctx: &UpdateContext<'_>,
) -> Result<Rc<Template>, BindError> {
    match source {
        TemplateSource::Template(template) => Ok(template.clone()),
        TemplateSource::Lazy { strings, mode } => ctx.resolve_template(strings, *mode),
    }
}
