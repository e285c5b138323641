// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Components: user render functions with hook state.

use alloc::borrow::Cow;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::cell::{Cell, RefCell};
use core::fmt;
use core::mem;

use understory_scope::ScopeId;

use crate::context::UpdateContext;
use crate::coroutine::Coroutine;
use crate::error::BoxError;
use crate::hooks::{Hook, RenderContext};
use crate::host::NodeId;
use crate::lane::Lanes;
use crate::part::Part;
use crate::slot::Slot;
use crate::value::Value;

/// A render function with props.
///
/// The component value itself carries the props; each render receives a
/// [`RenderContext`] for hooks and returns the value to bind at the
/// component's position.
///
/// ```
/// use understory_reconcile::{BoxError, Component, RenderContext, Value};
///
/// struct Greeting {
///     name: &'static str,
/// }
///
/// impl Component for Greeting {
///     fn render(&self, ctx: &mut RenderContext<'_, '_>) -> Result<Value, BoxError> {
///         let (count, _) = ctx.use_state(|| 0_u32);
///         Ok(Value::from(format!("hello {} ({count})", self.name)))
///     }
/// }
/// ```
pub trait Component: 'static {
    /// Renders the component.
    fn render(&self, ctx: &mut RenderContext<'_, '_>) -> Result<Value, BoxError>;

    /// Name used in render traces.
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(short_type_name(core::any::type_name::<Self>()))
    }

    /// Returns `false` to skip re-rendering when the parent binds new props.
    fn should_update(&self, previous: &Self) -> bool {
        let _ = previous;
        true
    }
}

fn short_type_name(name: &'static str) -> &'static str {
    let base = name.split('<').next().unwrap_or(name);
    base.rsplit("::").next().unwrap_or(base)
}

trait AnyComponent {
    fn render(&self, ctx: &mut RenderContext<'_, '_>) -> Result<Value, BoxError>;
    fn name(&self) -> Cow<'static, str>;
    fn should_update(&self, previous: &dyn AnyComponent) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<C: Component> AnyComponent for C {
    fn render(&self, ctx: &mut RenderContext<'_, '_>) -> Result<Value, BoxError> {
        Component::render(self, ctx)
    }

    fn name(&self) -> Cow<'static, str> {
        Component::name(self)
    }

    fn should_update(&self, previous: &dyn AnyComponent) -> bool {
        previous
            .as_any()
            .downcast_ref::<C>()
            .is_none_or(|previous| Component::should_update(self, previous))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A component together with its props, as bound at a child position.
#[derive(Clone)]
pub struct ComponentElement(Rc<dyn AnyComponent>);

impl fmt::Debug for ComponentElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentElement").field(&self.name()).finish()
    }
}

impl ComponentElement {
    /// Wraps a component.
    pub fn new(component: impl Component) -> Self {
        Self(Rc::new(component))
    }

    /// The component's name.
    #[must_use]
    pub fn name(&self) -> Cow<'static, str> {
        self.0.name()
    }

    /// Identity of the component type; bindings only accept elements of the
    /// type they were created for.
    #[must_use]
    pub fn component_type(&self) -> TypeId {
        self.0.as_any().type_id()
    }

    /// Borrows the component if it is a `C`.
    #[must_use]
    pub fn downcast_ref<C: Component>(&self) -> Option<&C> {
        self.0.as_any().downcast_ref()
    }

    /// Returns `true` if both elements are the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        core::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }

    pub(crate) fn should_update(&self, previous: &Self) -> bool {
        self.0.should_update(&*previous.0)
    }

    fn render(&self, ctx: &mut RenderContext<'_, '_>) -> Result<Value, BoxError> {
        self.0.render(ctx)
    }
}

struct InstanceState {
    element: ComponentElement,
    hooks: Vec<Hook>,
    child: Option<Slot>,
    /// Cleared while the binding is unbound.
    active: bool,
    connected: bool,
}

/// The live state of a bound component.
///
/// Instances are coroutines: rendering happens when the runtime resumes them,
/// and state setters schedule them through a weak handle.
pub(crate) struct ComponentInstance {
    this: Weak<Self>,
    part: Part,
    scope: ScopeId,
    pending_lanes: Cell<Lanes>,
    state: RefCell<InstanceState>,
}

impl ComponentInstance {
    pub(crate) fn new(element: ComponentElement, part: Part, ctx: &UpdateContext<'_>) -> Rc<Self> {
        let scope = ctx.runtime().create_scope(ctx.scope(), element.name());
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            part,
            scope,
            pending_lanes: Cell::new(Lanes::empty()),
            state: RefCell::new(InstanceState {
                element,
                hooks: Vec::new(),
                child: None,
                active: true,
                connected: true,
            }),
        })
    }

    pub(crate) fn weak(&self) -> Weak<Self> {
        self.this.clone()
    }

    pub(crate) fn scope_id(&self) -> ScopeId {
        self.scope
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    pub(crate) fn name(&self) -> Cow<'static, str> {
        self.state.borrow().element.name()
    }

    pub(crate) fn set_element(&self, element: ComponentElement) {
        self.state.borrow_mut().element = element;
    }

    /// Marks the instance for rendering in the current frame.
    pub(crate) fn request_render(self: &Rc<Self>, ctx: &mut UpdateContext<'_>) {
        self.state.borrow_mut().active = true;
        self.add_pending_lanes(ctx.lanes());
        ctx.enqueue_coroutine(self.clone());
    }

    pub(crate) fn unbind(&self, ctx: &mut UpdateContext<'_>) {
        let mut state = self.state.borrow_mut();
        state.active = false;
        if let Some(child) = &state.child {
            child.unbind(ctx);
        }
    }

    /// Disconnects the child, runs effect cleanups and drops the scope.
    pub(crate) fn disconnect(&self, ctx: &mut UpdateContext<'_>) {
        let (child, hooks) = {
            let mut state = self.state.borrow_mut();
            state.connected = false;
            (state.child.take(), mem::take(&mut state.hooks))
        };
        if let Some(child) = child {
            child.disconnect(ctx);
        }
        for hook in hooks {
            hook.dispose();
        }
        ctx.runtime().remove_scope(self.scope);
    }

    pub(crate) fn collect_nodes(&self, out: &mut Vec<NodeId>) {
        if let Some(child) = &self.state.borrow().child {
            child.collect_nodes(out);
        }
    }
}

impl Coroutine for ComponentInstance {
    fn scope(&self) -> Option<ScopeId> {
        Some(self.scope)
    }

    fn pending_lanes(&self) -> Lanes {
        self.pending_lanes.get()
    }

    fn add_pending_lanes(&self, lanes: Lanes) {
        self.pending_lanes.set(self.pending_lanes.get() | lanes);
    }

    fn resume(&self, ctx: &mut UpdateContext<'_>) -> Result<(), BoxError> {
        self.pending_lanes.set(Lanes::empty());
        let (element, mut hooks) = {
            let mut state = self.state.borrow_mut();
            if !state.connected || !state.active {
                return Ok(());
            }
            (state.element.clone(), mem::take(&mut state.hooks))
        };
        let mut ctx = ctx.with_scope(Some(self.scope));
        let rendered = {
            let mut render = RenderContext::new(&mut ctx, self, &mut hooks);
            let rendered = element.render(&mut render);
            render.finish();
            rendered
        };
        let mut state = self.state.borrow_mut();
        state.hooks = hooks;
        let value = rendered?;
        match &mut state.child {
            Some(child) => child.reconcile(value, &mut ctx)?,
            None => {
                let child = ctx.resolve_slot(value, self.part.clone())?;
                child.connect(&mut ctx)?;
                state.child = Some(child);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt as _;

    use super::*;
    use crate::lane::UpdateOptions;
    use crate::task::TaskStatus;
    use crate::testing::TestBackend;

    struct Label {
        text: &'static str,
        renders: Rc<Cell<u32>>,
    }

    impl Component for Label {
        fn render(&self, _: &mut RenderContext<'_, '_>) -> Result<Value, BoxError> {
            self.renders.set(self.renders.get() + 1);
            Ok(Value::from(self.text))
        }

        fn should_update(&self, previous: &Self) -> bool {
            self.text != previous.text
        }
    }

    struct Other;

    impl Component for Other {
        fn render(&self, _: &mut RenderContext<'_, '_>) -> Result<Value, BoxError> {
            Ok(Value::from("other"))
        }
    }

    #[test]
    fn element_reports_name_and_type() {
        let renders = Rc::new(Cell::new(0));
        let element = ComponentElement::new(Label {
            text: "a",
            renders,
        });
        assert_eq!(element.name(), "Label");
        assert_eq!(element.component_type(), TypeId::of::<Label>());
        assert_eq!(element.downcast_ref::<Label>().map(|l| l.text), Some("a"));
        assert!(element.downcast_ref::<Other>().is_none());
        assert!(element.ptr_eq(&element.clone()));
    }

    #[test]
    fn should_update_skips_renders_for_equal_props() {
        let (runtime, backend) = TestBackend::runtime();
        let (container, part) = backend.container();
        let renders = Rc::new(Cell::new(0));
        let label = |text| {
            Value::component(Label {
                text,
                renders: renders.clone(),
            })
        };
        let root = runtime
            .create_root(label("a"), part)
            .with_options(UpdateOptions::default().with_flush_sync(true));
        root.mount();
        assert_eq!(renders.get(), 1);

        root.update(label("a"));
        assert_eq!(renders.get(), 1, "equal props keep the last render");

        root.update(label("b"));
        assert_eq!(renders.get(), 2);
        assert_eq!(backend.html(container), "b");
    }

    #[test]
    fn another_component_type_replaces_the_instance() {
        let (runtime, backend) = TestBackend::runtime();
        let (container, part) = backend.container();
        let renders = Rc::new(Cell::new(0));
        let root = runtime
            .create_root(
                Value::component(Label {
                    text: "label",
                    renders: renders.clone(),
                }),
                part,
            )
            .with_options(UpdateOptions::default().with_flush_sync(true));
        root.mount();
        assert_eq!(backend.html(container), "label");

        let handle = root.update(Value::component(Other));
        assert_eq!(backend.html(container), "other");
        assert_eq!(
            handle.finished.now_or_never().and_then(Result::ok),
            Some(TaskStatus::DONE)
        );
        assert_eq!(renders.get(), 1);
    }

    #[test]
    fn unmounted_component_ignores_late_updates() {
        let (runtime, backend) = TestBackend::runtime();
        let (container, part) = backend.container();
        let updater = Rc::new(RefCell::new(None));

        struct Captures(Rc<RefCell<Option<crate::hooks::Updater>>>);

        impl Component for Captures {
            fn render(&self, ctx: &mut RenderContext<'_, '_>) -> Result<Value, BoxError> {
                *self.0.borrow_mut() = Some(ctx.force_update());
                Ok(Value::from("here"))
            }
        }

        let root = runtime
            .create_root(Value::component(Captures(updater.clone())), part)
            .with_options(UpdateOptions::default().with_flush_sync(true));
        root.mount();
        assert_eq!(backend.html(container), "here");
        root.unmount();
        assert_eq!(backend.html(container), "");

        let late = updater
            .borrow()
            .clone()
            .expect("component should have rendered")
            .schedule();
        assert_eq!(late.scheduled.now_or_never(), Some(TaskStatus::CANCELED));
        assert_eq!(runtime.pending_tasks(), 0);
    }
}
