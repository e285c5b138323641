// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bindings: the link between one dynamic value and one host location.
//!
//! Every binding follows the same lifecycle:
//!
//! - [`Binding::connect`] attaches it for the first time.
//! - [`Binding::bind`] updates it with a new value for the same site. A
//!   value identical to the memoized one is a no-op.
//! - [`Binding::unbind`] schedules removal of its host effects but keeps
//!   enough state to be rebound cheaply.
//! - [`Binding::disconnect`] tears it down for good without touching the
//!   host.
//! - [`Effect::commit`] applies whatever transition is pending.
//!
//! A binding enqueues itself into the mutation queue at most once between
//! two commits; later requests only change what the pending commit does.

mod component;
mod conditional;
mod primitive;
mod repeat;
mod spread;
mod template;

pub use template::Fragment;

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::backend::Backend;
use crate::context::UpdateContext;
use crate::effect::Effect;
use crate::error::BindError;
use crate::host::{HostTree, NodeId};
use crate::part::{Part, PartKind};
use crate::value::Value;

use component::ComponentBinding;
use conditional::ConditionalBinding;
use primitive::PrimitiveBinding;
use repeat::RepeatBinding;
use spread::SpreadBinding;
use template::TemplateBinding;

/// Commit state of a binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingStatus {
    /// The host reflects the binding.
    Committed,
    /// A value is waiting to be written.
    Mounting,
    /// Host effects are waiting to be removed.
    Unmounting,
}

/// The concrete kind of a binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingType {
    /// Writes an attribute.
    Attribute,
    /// Writes a property.
    Property,
    /// Installs an event listener.
    Event,
    /// Writes the content of a text node.
    Text,
    /// Renders a text node at a child position.
    Node,
    /// Writes several attributes, properties and listeners on one element.
    Spread,
    /// Renders a template at a child position.
    Template,
    /// Switches between two lazily built branches.
    Conditional,
    /// Renders a keyed list.
    Repeat,
    /// Renders a component.
    Component,
}

impl fmt::Display for BindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Attribute => "attribute",
            Self::Property => "property",
            Self::Event => "event",
            Self::Text => "text",
            Self::Node => "node",
            Self::Spread => "spread",
            Self::Template => "template",
            Self::Conditional => "conditional",
            Self::Repeat => "repeat",
            Self::Component => "component",
        })
    }
}

pub(crate) fn mismatch(expected: BindingType, value: &Value) -> BindError {
    BindError::SlotTypeMismatch {
        expected,
        actual: value.kind(),
    }
}

/// Status plus the at-most-once enqueue flag.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    status: BindingStatus,
    queued: bool,
}

impl Lifecycle {
    fn new() -> Self {
        Self {
            status: BindingStatus::Committed,
            queued: false,
        }
    }

    pub(crate) fn status(&self) -> BindingStatus {
        self.status
    }

    /// Marks the binding for mounting, enqueueing it if it is not queued yet.
    pub(crate) fn request_mount(&mut self, this: &Rc<Binding>, ctx: &mut UpdateContext<'_>) {
        self.status = BindingStatus::Mounting;
        self.enqueue(this, ctx);
    }

    /// Marks the binding for unmounting if anything was committed.
    pub(crate) fn request_unmount(
        &mut self,
        this: &Rc<Binding>,
        has_committed: bool,
        ctx: &mut UpdateContext<'_>,
    ) {
        if has_committed {
            self.status = BindingStatus::Unmounting;
            self.enqueue(this, ctx);
        } else {
            self.status = BindingStatus::Committed;
        }
    }

    /// Queues a transition again after a failed frame dropped its commit.
    fn requeue_pending(&mut self, this: &Rc<Binding>, ctx: &mut UpdateContext<'_>) {
        if self.status != BindingStatus::Committed {
            self.enqueue(this, ctx);
        }
    }

    /// Drops a mount that never reached the host. Pending unmounts stay.
    fn cancel_mount(&mut self) {
        if self.status == BindingStatus::Mounting {
            self.status = BindingStatus::Committed;
        }
    }

    fn enqueue(&mut self, this: &Rc<Binding>, ctx: &mut UpdateContext<'_>) {
        if !self.queued {
            self.queued = true;
            ctx.enqueue_mutation_effect(this.clone());
        }
    }
}

enum BindingKind {
    Primitive(PrimitiveBinding),
    Spread(SpreadBinding),
    Template(TemplateBinding),
    Conditional(ConditionalBinding),
    Repeat(RepeatBinding),
    Component(ComponentBinding),
}

struct BindingState {
    life: Lifecycle,
    kind: BindingKind,
}

/// A live binding of one value to one [`Part`].
///
/// Bindings are shared (`Rc`) because they enqueue themselves as effects.
pub struct Binding {
    part: Part,
    state: RefCell<BindingState>,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Binding");
        s.field("part", &self.part);
        if let Ok(state) = self.state.try_borrow() {
            s.field("type", &state.kind.binding_type())
                .field("status", &state.life.status);
        }
        s.finish_non_exhaustive()
    }
}

impl Binding {
    /// Picks the binding kind for `value` at `part`.
    ///
    /// Directives only bind at child positions and spreads only bind to
    /// elements; everything else goes through
    /// [`Backend::resolve_primitive`].
    pub(crate) fn resolve(
        value: Value,
        part: Part,
        backend: &dyn Backend,
    ) -> Result<Rc<Self>, BindError> {
        let part_kind = part.kind();
        let misplaced = || BindError::PartMismatch {
            value: value.kind(),
            part: part_kind,
        };
        let kind = match &value {
            Value::Template(_) | Value::Conditional(_) | Value::Repeat(_) | Value::Component(_)
                if part_kind != PartKind::ChildNode =>
            {
                return Err(misplaced());
            }
            Value::Spread(_) if part_kind != PartKind::Element => return Err(misplaced()),
            Value::Template(v) => BindingKind::Template(TemplateBinding::new(v.clone())),
            Value::Conditional(v) => BindingKind::Conditional(ConditionalBinding::new(v.clone())),
            Value::Repeat(v) => BindingKind::Repeat(RepeatBinding::new(v.clone())),
            Value::Component(v) => BindingKind::Component(ComponentBinding::new(v.clone())),
            Value::Spread(v) => BindingKind::Spread(SpreadBinding::new(v.clone())),
            _ => {
                let ty = backend.resolve_primitive(&value, &part)?;
                BindingKind::Primitive(PrimitiveBinding::new(ty, value))
            }
        };
        Ok(Rc::new(Self {
            part,
            state: RefCell::new(BindingState {
                life: Lifecycle::new(),
                kind,
            }),
        }))
    }

    /// The location this binding writes to.
    #[must_use]
    pub fn part(&self) -> &Part {
        &self.part
    }

    /// The concrete kind.
    #[must_use]
    pub fn binding_type(&self) -> BindingType {
        self.state.borrow().kind.binding_type()
    }

    /// The commit state.
    #[must_use]
    pub fn status(&self) -> BindingStatus {
        self.state.borrow().life.status
    }

    /// Returns `true` if [`bind`](Self::bind) can take `value` without
    /// replacing this binding.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        let state = self.state.borrow();
        match &state.kind {
            BindingKind::Primitive(p) => p.accepts(value),
            BindingKind::Spread(_) => matches!(value, Value::Spread(_)),
            BindingKind::Template(_) => matches!(value, Value::Template(_)),
            BindingKind::Conditional(_) => matches!(value, Value::Conditional(_)),
            BindingKind::Repeat(_) => matches!(value, Value::Repeat(_)),
            BindingKind::Component(c) => c.accepts(value),
        }
    }

    /// Attaches the binding for the first time.
    pub fn connect(self: &Rc<Self>, ctx: &mut UpdateContext<'_>) -> Result<(), BindError> {
        let mut state = self.state.borrow_mut();
        let BindingState { life, kind } = &mut *state;
        match kind {
            BindingKind::Primitive(b) => {
                b.connect(self, life, ctx);
                Ok(())
            }
            BindingKind::Spread(b) => {
                b.connect(self, life, ctx);
                Ok(())
            }
            BindingKind::Template(b) => b.connect(self, life, ctx),
            BindingKind::Conditional(b) => b.connect(self, ctx),
            BindingKind::Repeat(b) => b.connect(self, life, ctx),
            BindingKind::Component(b) => {
                b.connect(self, ctx);
                Ok(())
            }
        }
    }

    /// Updates the binding with a new value for the same site.
    ///
    /// Returns [`BindError::SlotTypeMismatch`] if the value needs a binding
    /// of another kind.
    pub fn bind(self: &Rc<Self>, value: Value, ctx: &mut UpdateContext<'_>) -> Result<(), BindError> {
        let mut state = self.state.borrow_mut();
        let BindingState { life, kind } = &mut *state;
        life.requeue_pending(self, ctx);
        match kind {
            BindingKind::Primitive(b) => b.bind(value, self, life, ctx),
            BindingKind::Spread(b) => b.bind(value, self, life, ctx),
            BindingKind::Template(b) => b.bind(value, self, life, ctx),
            BindingKind::Conditional(b) => b.bind(value, self, ctx),
            BindingKind::Repeat(b) => b.bind(value, self, life, ctx),
            BindingKind::Component(b) => b.bind(value, ctx),
        }
    }

    /// Schedules removal of this binding's host effects.
    pub fn unbind(self: &Rc<Self>, ctx: &mut UpdateContext<'_>) {
        let mut state = self.state.borrow_mut();
        let BindingState { life, kind } = &mut *state;
        match kind {
            BindingKind::Primitive(b) => b.unbind(self, life, ctx),
            BindingKind::Spread(b) => b.unbind(self, life, ctx),
            BindingKind::Template(b) => b.unbind(self, life, ctx),
            BindingKind::Conditional(b) => b.unbind(ctx),
            BindingKind::Repeat(b) => b.unbind(self, life, ctx),
            BindingKind::Component(b) => b.unbind(ctx),
        }
    }

    /// Tears the binding down without touching the host.
    ///
    /// A queued unmount still runs; a queued mount is dropped, so content
    /// that was replaced before its first commit never reaches the host.
    pub fn disconnect(&self, ctx: &mut UpdateContext<'_>) {
        let mut state = self.state.borrow_mut();
        state.life.cancel_mount();
        match &mut state.kind {
            BindingKind::Primitive(_) | BindingKind::Spread(_) => {}
            BindingKind::Template(b) => b.disconnect(ctx),
            BindingKind::Conditional(b) => b.disconnect(ctx),
            BindingKind::Repeat(b) => b.disconnect(ctx),
            BindingKind::Component(b) => b.disconnect(ctx),
        }
    }

    /// Appends the host nodes this binding currently has in the tree, in
    /// document order. Only child-position bindings own nodes.
    pub fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        let state = self.state.borrow();
        match &state.kind {
            BindingKind::Primitive(b) => b.collect_nodes(out),
            BindingKind::Spread(_) => {}
            BindingKind::Template(b) => b.collect_nodes(out),
            BindingKind::Conditional(b) => b.collect_nodes(out),
            BindingKind::Repeat(b) => b.collect_nodes(out),
            BindingKind::Component(b) => b.collect_nodes(out),
        }
    }
}

impl BindingKind {
    fn binding_type(&self) -> BindingType {
        match self {
            Self::Primitive(p) => p.binding_type(),
            Self::Spread(_) => BindingType::Spread,
            Self::Template(_) => BindingType::Template,
            Self::Conditional(_) => BindingType::Conditional,
            Self::Repeat(_) => BindingType::Repeat,
            Self::Component(_) => BindingType::Component,
        }
    }

    fn mount(&mut self, host: &dyn HostTree, part: &Part) {
        match self {
            Self::Primitive(b) => b.mount(host, part),
            Self::Spread(b) => b.mount(host, part),
            Self::Template(b) => b.mount(host, part),
            Self::Repeat(b) => b.mount(host, part),
            Self::Conditional(_) | Self::Component(_) => {}
        }
    }

    fn unmount(&mut self, host: &dyn HostTree, part: &Part) {
        match self {
            Self::Primitive(b) => b.unmount(host, part),
            Self::Spread(b) => b.unmount(host, part),
            Self::Template(b) => b.unmount(host),
            Self::Repeat(b) => b.unmount(host),
            Self::Conditional(_) | Self::Component(_) => {}
        }
    }
}

impl Effect for Binding {
    fn commit(&self, host: &dyn HostTree) {
        let mut state = self.state.borrow_mut();
        let BindingState { life, kind } = &mut *state;
        life.queued = false;
        match life.status {
            BindingStatus::Committed => return,
            BindingStatus::Mounting => kind.mount(host, &self.part),
            BindingStatus::Unmounting => kind.unmount(host, &self.part),
        }
        life.status = BindingStatus::Committed;
    }

    fn discard(&self) {
        // The pending transition is kept; the next bind queues it again.
        self.state.borrow_mut().life.queued = false;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use core::cell::Cell;

    use futures::FutureExt as _;

    use understory_scope::ScopeId;

    use super::*;
    use crate::coroutine::Coroutine;
    use crate::error::BoxError;
    use crate::host::HostOp;
    use crate::lane::{Lanes, UpdateOptions};
    use crate::root::Root;
    use crate::runtime::Runtime;
    use crate::slot::Slot;
    use crate::task::{TaskStatus, UpdateHandle};
    use crate::template::{Template, TemplateMode, TemplateNode, TemplateResult};
    use crate::testing::TestBackend;
    use crate::value::{Branch, ConditionalValue, ValueKind};

    fn sync_root(runtime: &Runtime, value: impl Into<Value>, part: Part) -> Root {
        runtime
            .create_root(value, part)
            .with_options(UpdateOptions::default().with_flush_sync(true))
    }

    fn done(handle: UpdateHandle) -> bool {
        matches!(handle.finished.now_or_never(), Some(Ok(TaskStatus::DONE)))
    }

    fn bind_error(handle: UpdateHandle) -> BindError {
        let error = handle
            .finished
            .now_or_never()
            .and_then(Result::err)
            .expect("frame should fail");
        error
            .cause()
            .downcast_ref::<BindError>()
            .cloned()
            .expect("cause should be a bind error")
    }

    /// Binds each value in turn to one slot, all within a single resume.
    struct Rebind {
        part: Part,
        values: Vec<Value>,
        lanes: Cell<Lanes>,
        slot: RefCell<Option<Slot>>,
    }

    impl Coroutine for Rebind {
        fn scope(&self) -> Option<ScopeId> {
            None
        }

        fn pending_lanes(&self) -> Lanes {
            self.lanes.get()
        }

        fn add_pending_lanes(&self, lanes: Lanes) {
            self.lanes.set(self.lanes.get() | lanes);
        }

        fn resume(&self, ctx: &mut UpdateContext<'_>) -> Result<(), BoxError> {
            self.lanes.set(Lanes::empty());
            let mut slot = self.slot.borrow_mut();
            for value in &self.values {
                match slot.as_mut() {
                    Some(slot) => slot.reconcile(value.clone(), ctx)?,
                    None => {
                        let created = ctx.resolve_slot(value.clone(), self.part.clone())?;
                        created.connect(ctx)?;
                        *slot = Some(created);
                    }
                }
            }
            Ok(())
        }
    }

    /// `<div title=?>?</div>`
    fn titled_div() -> Rc<Template> {
        Rc::new(Template::new(
            vec![
                TemplateNode::element("div")
                    .attribute_hole("title")
                    .child(TemplateNode::ChildHole),
            ],
            TemplateMode::Html,
        ))
    }

    #[test]
    fn rebinding_an_equal_value_does_nothing() {
        let (runtime, backend) = TestBackend::runtime();
        let (container, part) = backend.container();
        let root = sync_root(&runtime, "a", part);
        assert!(done(root.mount()));
        assert_eq!(backend.html(container), "a");
        let text = backend.memory().children(container)[0];
        backend.memory().take_ops();
        backend.take_calls();

        assert!(done(root.update("a")));
        assert!(backend.memory().take_ops().is_empty());
        assert!(backend.take_calls().is_empty(), "no effect was queued");

        root.update("b");
        assert_eq!(
            backend.memory().take_ops(),
            [HostOp::SetText(text, "b".into())]
        );

        root.update(Value::Null);
        assert_eq!(backend.html(container), "");
    }

    #[test]
    fn child_position_swaps_binding_when_the_value_kind_changes() {
        let (runtime, backend) = TestBackend::runtime();
        let (container, part) = backend.container();
        let bold = Rc::new(Template::new(
            vec![TemplateNode::element("b").child(TemplateNode::text("bold"))],
            TemplateMode::Html,
        ));
        let root = sync_root(&runtime, "plain", part);
        root.mount();

        assert!(done(root.update(TemplateResult::new(bold, []))));
        assert_eq!(backend.html(container), "<b>bold</b>");

        assert!(done(root.update("plain again")));
        assert_eq!(backend.html(container), "plain again");
    }

    #[test]
    fn template_switch_removes_the_old_fragment_first() {
        let (runtime, backend) = TestBackend::runtime();
        let (container, part) = backend.container();
        let a = Rc::new(Template::new(vec![TemplateNode::text("A")], TemplateMode::Html));
        let b = Rc::new(Template::new(vec![TemplateNode::text("B")], TemplateMode::Html));
        let root = sync_root(&runtime, TemplateResult::new(a, []), part);
        root.mount();
        let old = backend.memory().children(container)[0];
        backend.memory().take_ops();

        root.update(TemplateResult::new(b, []));
        assert_eq!(backend.html(container), "B");
        let ops = backend.memory().take_ops();
        let removed = ops
            .iter()
            .position(|op| *op == HostOp::Remove(old))
            .expect("old fragment should be removed");
        let inserted = ops
            .iter()
            .position(|op| matches!(op, HostOp::Insert { node, .. } if *node != old))
            .expect("new fragment should be inserted");
        assert!(removed < inserted);
    }

    #[test]
    fn same_template_updates_holes_in_place() {
        let (runtime, backend) = TestBackend::runtime();
        let (container, part) = backend.container();
        let template = titled_div();
        let root = sync_root(
            &runtime,
            TemplateResult::new(template.clone(), [Value::from("x"), Value::from("body")]),
            part,
        );
        root.mount();
        assert_eq!(backend.html(container), "<div title=\"x\">body</div>");
        let div = backend.memory().children(container)[0];

        root.update(TemplateResult::new(template, [Value::Null, Value::from("next")]));
        assert_eq!(backend.html(container), "<div>next</div>");
        assert_eq!(backend.memory().children(container)[0], div);
    }

    #[test]
    fn strict_slot_rejects_another_binding_type() {
        let (runtime, backend) = TestBackend::runtime();
        let (container, part) = backend.container();
        let template = titled_div();
        let root = sync_root(
            &runtime,
            TemplateResult::new(template.clone(), [Value::from("x"), Value::Null]),
            part,
        );
        assert!(done(root.mount()));

        let empty = Rc::new(Template::new(vec![], TemplateMode::Html));
        let nested = Value::from(TemplateResult::new(empty, []));
        let handle = root.update(TemplateResult::new(template, [nested, Value::Null]));
        assert_eq!(
            bind_error(handle),
            BindError::SlotTypeMismatch {
                expected: BindingType::Attribute,
                actual: ValueKind::Template,
            }
        );
        assert_eq!(backend.html(container), "<div title=\"x\"></div>");
    }

    #[test]
    fn directive_in_an_attribute_hole_is_rejected() {
        let (runtime, backend) = TestBackend::runtime();
        let (_, part) = backend.container();
        let empty = Rc::new(Template::new(vec![], TemplateMode::Html));
        let nested = Value::from(TemplateResult::new(empty, []));
        let root = sync_root(
            &runtime,
            TemplateResult::new(titled_div(), [nested, Value::Null]),
            part,
        );
        assert_eq!(
            bind_error(root.mount()),
            BindError::PartMismatch {
                value: ValueKind::Template,
                part: PartKind::Attribute,
            }
        );
    }

    #[test]
    fn event_hole_only_takes_listeners() {
        let (runtime, backend) = TestBackend::runtime();
        let (_, part) = backend.container();
        let button = Rc::new(Template::new(
            vec![TemplateNode::element("button").event_hole("click")],
            TemplateMode::Html,
        ));
        let root = sync_root(
            &runtime,
            TemplateResult::new(button, [Value::from("oops")]),
            part,
        );
        assert_eq!(
            bind_error(root.mount()),
            BindError::PartMismatch {
                value: ValueKind::String,
                part: PartKind::Event,
            }
        );
    }

    #[test]
    fn wrong_number_of_values_is_reported() {
        let (runtime, backend) = TestBackend::runtime();
        let (_, part) = backend.container();
        let root = sync_root(
            &runtime,
            TemplateResult::new(titled_div(), [Value::from("x")]),
            part,
        );
        assert_eq!(
            bind_error(root.mount()),
            BindError::HoleCountMismatch {
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn conditional_builds_each_branch_lazily() {
        let (runtime, backend) = TestBackend::runtime();
        let (container, part) = backend.container();
        let built = Rc::new(RefCell::new(Vec::new()));
        let log = built.clone();
        let yes: Branch = Rc::new(move || {
            log.borrow_mut().push("yes");
            Value::from("yes")
        });
        let log = built.clone();
        let no: Branch = Rc::new(move || {
            log.borrow_mut().push("no");
            Value::from("no")
        });
        let choose = |condition: bool| {
            Value::Conditional(Rc::new(ConditionalValue::new(
                condition,
                yes.clone(),
                no.clone(),
            )))
        };

        let root = sync_root(&runtime, choose(true), part);
        root.mount();
        assert_eq!(backend.html(container), "yes");
        assert_eq!(*built.borrow(), ["yes"], "the false branch is not built yet");

        root.update(choose(false));
        assert_eq!(backend.html(container), "no");

        root.update(choose(true));
        assert_eq!(backend.html(container), "yes");
        assert_eq!(*built.borrow(), ["yes", "no"], "unchanged branches are reused");
    }

    #[test]
    fn repeat_moves_items_by_key() {
        let (runtime, backend) = TestBackend::runtime();
        let (container, part) = backend.container();
        let list = |items: &[(u32, &'static str)]| Value::repeat(items.iter().copied());
        let root = sync_root(&runtime, list(&[(1, "a"), (2, "b"), (3, "c")]), part);
        root.mount();
        assert_eq!(backend.html(container), "abc");
        backend.memory().take_ops();

        root.update(list(&[(3, "c"), (1, "a"), (2, "b")]));
        assert_eq!(backend.html(container), "cab");
        let ops = backend.memory().take_ops();
        assert!(
            ops.iter()
                .all(|op| matches!(op, HostOp::Insert { .. })),
            "reordering only moves nodes: {ops:?}"
        );

        root.update(list(&[(1, "a"), (4, "d")]));
        assert_eq!(backend.html(container), "ad");

        root.update(Value::Null);
        assert_eq!(backend.html(container), "");
        assert_eq!(
            backend.memory().children(container).len(),
            1,
            "only the root anchor is left"
        );
    }

    #[test]
    fn spread_diffs_named_entries() {
        let (runtime, backend) = TestBackend::runtime();
        let (container, part) = backend.container();
        let input = Rc::new(Template::new(
            vec![TemplateNode::element("input").spread_hole()],
            TemplateMode::Html,
        ));
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        let on_click = Value::listener(move |_| counter.set(counter.get() + 1));
        let first = Value::spread([
            ("title", Value::from("t")),
            (".value", Value::from(1)),
            ("@click", on_click),
        ]);
        let root = sync_root(&runtime, TemplateResult::new(input.clone(), [first]), part);
        root.mount();
        let node = backend.memory().children(container)[0];
        assert_eq!(backend.memory().attribute(node, "title").as_deref(), Some("t"));
        assert!(backend.memory().property(node, "value").is_some());
        assert!(backend.memory().dispatch_event(node, "click", &()));
        assert_eq!(clicks.get(), 1);

        let second = Value::spread([("title", "u")]);
        root.update(TemplateResult::new(input, [second]));
        assert_eq!(backend.memory().attribute(node, "title").as_deref(), Some("u"));
        assert!(backend.memory().property(node, "value").is_none());
        assert!(!backend.memory().dispatch_event(node, "click", &()));
    }

    #[test]
    fn fragment_replaced_before_commit_never_reaches_the_host() {
        let (runtime, backend) = TestBackend::runtime();
        let (container, part) = backend.container();
        let fresh = Rc::new(Template::new(vec![TemplateNode::text("fresh")], TemplateMode::Html));
        let stale = TemplateResult::new(titled_div(), [Value::from("old"), Value::from("old body")]);
        let rebind = Rc::new(Rebind {
            part,
            values: vec![stale.into(), TemplateResult::new(fresh, []).into()],
            lanes: Cell::new(Lanes::empty()),
            slot: RefCell::new(None),
        });
        let handle = runtime.schedule_update(
            rebind,
            UpdateOptions::default().with_flush_sync(true),
        );

        assert!(done(handle));
        assert_eq!(backend.html(container), "fresh");
        let ops = backend.memory().take_ops();
        let div = ops
            .iter()
            .find_map(|op| match op {
                HostOp::CreateElement(node, tag) if tag == "div" => Some(*node),
                _ => None,
            })
            .expect("the replaced template was instantiated");
        assert!(
            ops.iter().all(|op| match op {
                HostOp::Insert { node, .. } => *node != div,
                HostOp::CreateText(_, text) => text != "old body",
                HostOp::SetAttribute { node, .. } => *node != div,
                _ => true,
            }),
            "nothing of the replaced fragment was committed: {ops:?}"
        );
    }

    #[test]
    fn duplicate_keys_render_every_item_and_the_last_one_owns_the_key() {
        let (runtime, backend) = TestBackend::runtime();
        let (container, part) = backend.container();
        let list = |items: &[(u32, &'static str)]| Value::repeat(items.iter().copied());
        let root = sync_root(&runtime, list(&[(1, "a"), (1, "b"), (2, "z")]), part);
        root.mount();
        assert_eq!(backend.html(container), "abz");

        root.update(list(&[(2, "z"), (1, "c")]));
        assert_eq!(backend.html(container), "zc", "key 1 reuses the item that showed b");

        root.update(list(&[(1, "x"), (1, "y")]));
        assert_eq!(backend.html(container), "xy");
    }
}
