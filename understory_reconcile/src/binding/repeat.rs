// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::mem;

use hashbrown::{HashMap, HashSet};

use super::{Binding, BindingStatus, BindingType, Lifecycle, mismatch};
use crate::context::UpdateContext;
use crate::error::BindError;
use crate::host::{HostTree, NodeId};
use crate::part::Part;
use crate::slot::Slot;
use crate::value::{Key, RepeatValue, Value};

/// One rendered list item: a trailing comment anchor and the slot bound
/// before it.
struct RepeatItem {
    key: Key,
    anchor: NodeId,
    slot: RefCell<Slot>,
}

/// Renders a keyed list at a child position.
///
/// Layout in the host, for items `a` and `b`:
///
/// ```text
/// <!--head--> [a content] <!--a--> [b content] <!--b--> <!--part anchor-->
/// ```
///
/// Reordering moves whole item ranges; items whose anchor already sits right
/// before the next item's range are left alone.
pub(super) struct RepeatBinding {
    value: Option<Rc<RepeatValue>>,
    unbound: bool,
    head: Option<NodeId>,
    head_attached: bool,
    /// Items as of the last bind.
    pending: Vec<Rc<RepeatItem>>,
    /// Items as of the last commit.
    committed: Vec<Rc<RepeatItem>>,
    /// Items dropped since the last commit, whose anchors still need removing.
    removed: Vec<Rc<RepeatItem>>,
}

impl RepeatBinding {
    pub(super) fn new(value: Rc<RepeatValue>) -> Self {
        Self {
            value: Some(value),
            unbound: false,
            head: None,
            head_attached: false,
            pending: Vec::new(),
            committed: Vec::new(),
            removed: Vec::new(),
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
        life.request_mount(this, ctx);
        self.head = Some(ctx.host().create_comment(""));
        for (key, item) in value.items() {
            let item = create_item(key.clone(), item.clone(), ctx)?;
            self.pending.push(item);
        }
        Ok(())
    }

    pub(super) fn bind(
        &mut self,
        value: Value,
        this: &Rc<Binding>,
        life: &mut Lifecycle,
        ctx: &mut UpdateContext<'_>,
    ) -> Result<(), BindError> {
        let Value::Repeat(value) = value else {
            return Err(mismatch(BindingType::Repeat, &value));
        };
        let same = self.value.as_ref().is_some_and(|v| Rc::ptr_eq(v, &value));
        if same && !self.unbound && life.status() != BindingStatus::Unmounting {
            return Ok(());
        }
        life.request_mount(this, ctx);

        // With duplicate keys the last occurrence owns the key.
        let mut previous: HashMap<Key, Rc<RepeatItem>> = self
            .pending
            .iter()
            .map(|item| (item.key.clone(), item.clone()))
            .collect();
        let mut next = Vec::with_capacity(value.items().len());
        for (key, item_value) in value.items() {
            match previous.remove(key) {
                Some(item) => {
                    item.slot.borrow_mut().reconcile(item_value.clone(), ctx)?;
                    next.push(item);
                }
                None => next.push(create_item(key.clone(), item_value.clone(), ctx)?),
            }
        }

        let retained: HashSet<*const RepeatItem> = next.iter().map(Rc::as_ptr).collect();
        for item in mem::replace(&mut self.pending, next) {
            if !retained.contains(&Rc::as_ptr(&item)) {
                let slot = item.slot.borrow();
                slot.unbind(ctx);
                slot.disconnect(ctx);
                drop(slot);
                self.removed.push(item);
            }
        }
        self.value = Some(value);
        self.unbound = false;
        Ok(())
    }

    pub(super) fn unbind(
        &mut self,
        this: &Rc<Binding>,
        life: &mut Lifecycle,
        ctx: &mut UpdateContext<'_>,
    ) {
        self.value = None;
        self.unbound = true;
        life.request_unmount(this, self.head_attached, ctx);
        for item in &self.pending {
            item.slot.borrow().unbind(ctx);
        }
    }

    pub(super) fn disconnect(&mut self, ctx: &mut UpdateContext<'_>) {
        for item in &self.pending {
            item.slot.borrow().disconnect(ctx);
        }
    }

    pub(super) fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        if !self.head_attached {
            return;
        }
        if let Some(head) = self.head {
            out.push(head);
        }
        for item in &self.committed {
            item.slot.borrow().collect_nodes(out);
            out.push(item.anchor);
        }
    }

    pub(super) fn mount(&mut self, host: &dyn HostTree, part: &Part) {
        let Some(head) = self.head else {
            return;
        };
        for item in self.removed.drain(..) {
            host.remove(item.anchor);
        }
        let mut reference = part.node();
        let mut nodes = Vec::new();
        for item in self.pending.iter().rev() {
            nodes.clear();
            item.slot.borrow().collect_nodes(&mut nodes);
            nodes.push(item.anchor);
            if host.next_sibling(item.anchor) != Some(reference) {
                for node in &nodes {
                    host.insert_before(*node, reference);
                }
            }
            reference = nodes[0];
        }
        if host.next_sibling(head) != Some(reference) {
            host.insert_before(head, reference);
        }
        self.head_attached = true;
        self.committed.clone_from(&self.pending);
    }

    pub(super) fn unmount(&mut self, host: &dyn HostTree) {
        for item in self.removed.drain(..).chain(self.committed.drain(..)) {
            host.remove(item.anchor);
        }
        if let Some(head) = self.head {
            host.remove(head);
        }
        self.head_attached = false;
    }
}

fn create_item(
    key: Key,
    value: Value,
    ctx: &mut UpdateContext<'_>,
) -> Result<Rc<RepeatItem>, BindError> {
    let anchor = ctx.host().create_comment("");
    let slot = ctx.resolve_slot(value, Part::ChildNode { anchor })?;
    slot.connect(ctx)?;
    Ok(Rc::new(RepeatItem {
        key,
        anchor,
        slot: RefCell::new(slot),
    }))
}
