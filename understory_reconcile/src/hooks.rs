// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hooks: per-instance state addressed by call order.
//!
//! Every hook call during a render takes the next entry of the instance's
//! hook list. A component must call the same hooks in the same order on
//! every render; when it does not, the mismatching entry is logged and
//! replaced by a fresh one.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::any::Any;
use core::cell::{Cell, RefCell};
use core::error::Error;
use core::fmt;

use tracing::warn;
use understory_scope::ScopeId;

use crate::component::ComponentInstance;
use crate::context::UpdateContext;
use crate::effect::{CommitPhase, Effect};
use crate::error::ErrorHandle;
use crate::host::HostTree;
use crate::lane::{Lanes, UpdateOptions};
use crate::runtime::{Runtime, WeakRuntime};
use crate::task::UpdateHandle;

/// Undoes an effect. Runs before the effect's next setup and on disconnect.
pub type Cleanup = Box<dyn FnOnce()>;

type Setup = Box<dyn FnOnce() -> Option<Cleanup>>;

/// One entry in a component's hook list.
pub(crate) enum Hook {
    State(Rc<dyn Any>),
    Ref(Rc<dyn Any>),
    Memo {
        deps: Box<dyn Any>,
        value: Box<dyn Any>,
    },
    Effect(Rc<EffectHook>),
    Id(Rc<str>),
}

impl Hook {
    fn kind(&self) -> &'static str {
        match self {
            Self::State(_) => "state",
            Self::Ref(_) => "ref",
            Self::Memo { .. } => "memo",
            Self::Effect(_) => "effect",
            Self::Id(_) => "id",
        }
    }

    /// Releases the hook, running any pending effect cleanup.
    pub(crate) fn dispose(self) {
        if let Self::Effect(effect) = self {
            effect.dispose();
        }
    }
}

/// A queued setup plus the cleanup of the last committed one.
pub(crate) struct EffectHook {
    phase: CommitPhase,
    deps: RefCell<Box<dyn Any>>,
    setup: RefCell<Option<Setup>>,
    cleanup: RefCell<Option<Cleanup>>,
    disposed: Cell<bool>,
}

impl EffectHook {
    fn run_cleanup(&self) {
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }

    fn dispose(&self) {
        self.disposed.set(true);
        self.setup.borrow_mut().take();
        self.run_cleanup();
    }
}

impl Effect for EffectHook {
    fn commit(&self, _host: &dyn HostTree) {
        if self.disposed.get() {
            return;
        }
        let setup = self.setup.borrow_mut().take();
        if let Some(setup) = setup {
            self.run_cleanup();
            let cleanup = setup();
            *self.cleanup.borrow_mut() = cleanup;
        }
    }
}

/// Schedules a re-render of one component.
///
/// Holds only weak references, so it may outlive both the component and the
/// runtime; scheduling then yields an already canceled handle.
#[derive(Clone)]
pub struct Updater {
    instance: Weak<ComponentInstance>,
    runtime: WeakRuntime,
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("alive", &(self.instance.strong_count() > 0))
            .finish_non_exhaustive()
    }
}

impl Updater {
    /// Schedules an update with default options.
    pub fn schedule(&self) -> UpdateHandle {
        self.schedule_with(UpdateOptions::default())
    }

    /// Schedules an update.
    pub fn schedule_with(&self, options: UpdateOptions) -> UpdateHandle {
        match (self.instance.upgrade(), self.runtime.upgrade()) {
            (Some(instance), Some(runtime)) if instance.is_connected() => {
                runtime.schedule_update(instance, options)
            }
            _ => UpdateHandle::canceled(),
        }
    }
}

/// Setter returned by [`RenderContext::use_state`].
pub struct StateSetter<T> {
    cell: Rc<RefCell<T>>,
    updater: Updater,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            updater: self.updater.clone(),
        }
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter").finish_non_exhaustive()
    }
}

impl<T: 'static> StateSetter<T> {
    /// Replaces the state and schedules a re-render.
    pub fn set(&self, value: T) -> UpdateHandle {
        *self.cell.borrow_mut() = value;
        self.updater.schedule()
    }

    /// Replaces the state with the given options.
    pub fn set_with(&self, value: T, options: UpdateOptions) -> UpdateHandle {
        *self.cell.borrow_mut() = value;
        self.updater.schedule_with(options)
    }

    /// Mutates the state in place and schedules a re-render.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> UpdateHandle {
        f(&mut self.cell.borrow_mut());
        self.updater.schedule()
    }

    /// Reads the latest state, which may be newer than the rendered one.
    #[must_use]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.cell.borrow().clone()
    }
}

/// What a component sees while rendering.
pub struct RenderContext<'a, 'b> {
    update: &'a mut UpdateContext<'b>,
    instance: &'a ComponentInstance,
    hooks: &'a mut Vec<Hook>,
    cursor: usize,
}

impl fmt::Debug for RenderContext<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("scope", &self.instance.scope_id())
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

impl<'a, 'b> RenderContext<'a, 'b> {
    pub(crate) fn new(
        update: &'a mut UpdateContext<'b>,
        instance: &'a ComponentInstance,
        hooks: &'a mut Vec<Hook>,
    ) -> Self {
        Self {
            update,
            instance,
            hooks,
            cursor: 0,
        }
    }

    /// Drops hooks a shorter render did not reach.
    pub(crate) fn finish(self) {
        if self.cursor < self.hooks.len() {
            warn!(
                component = %self.instance.name(),
                expected = self.hooks.len(),
                actual = self.cursor,
                "component rendered fewer hooks than before"
            );
            for hook in self.hooks.drain(self.cursor..) {
                hook.dispose();
            }
        }
    }

    /// The runtime.
    #[must_use]
    pub fn runtime(&self) -> &'b Runtime {
        self.update.runtime()
    }

    /// The component's scope.
    #[must_use]
    pub fn scope(&self) -> ScopeId {
        self.instance.scope_id()
    }

    /// The lanes being rendered.
    #[must_use]
    pub fn lanes(&self) -> Lanes {
        self.update.lanes()
    }

    /// The underlying update context.
    pub fn update_context(&mut self) -> &mut UpdateContext<'b> {
        self.update
    }

    /// A handle that re-renders this component.
    #[must_use]
    pub fn force_update(&self) -> Updater {
        Updater {
            instance: self.instance.weak(),
            runtime: self.runtime().downgrade(),
        }
    }

    /// Takes the next hook slot, returning the existing entry if any.
    fn next_hook(&mut self) -> (usize, Option<&mut Hook>) {
        let index = self.cursor;
        self.cursor += 1;
        (index, self.hooks.get_mut(index))
    }

    /// Stores `hook` at `index`, replacing a mismatching entry.
    fn install(&mut self, index: usize, hook: Hook) {
        if index < self.hooks.len() {
            let old = core::mem::replace(&mut self.hooks[index], hook);
            warn!(
                component = %self.instance.name(),
                index,
                expected = self.hooks[index].kind(),
                found = old.kind(),
                "hook order changed between renders; reinitializing"
            );
            old.dispose();
        } else {
            self.hooks.push(hook);
        }
    }

    /// Component state that survives re-renders.
    ///
    /// Returns the current value and a setter that schedules an update.
    pub fn use_state<T: Clone + 'static>(&mut self, init: impl FnOnce() -> T) -> (T, StateSetter<T>) {
        let (index, existing) = self.next_hook();
        let found = match existing {
            Some(Hook::State(cell)) => cell.clone().downcast::<RefCell<T>>().ok(),
            _ => None,
        };
        let cell = match found {
            Some(cell) => cell,
            None => {
                let cell = Rc::new(RefCell::new(init()));
                self.install(index, Hook::State(cell.clone()));
                cell
            }
        };
        let value = cell.borrow().clone();
        let setter = StateSetter {
            cell,
            updater: self.force_update(),
        };
        (value, setter)
    }

    /// A mutable cell that survives re-renders without scheduling any.
    pub fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
        let (index, existing) = self.next_hook();
        let found = match existing {
            Some(Hook::Ref(cell)) => cell.clone().downcast::<RefCell<T>>().ok(),
            _ => None,
        };
        match found {
            Some(cell) => cell,
            None => {
                let cell = Rc::new(RefCell::new(init()));
                self.install(index, Hook::Ref(cell.clone()));
                cell
            }
        }
    }

    /// Recomputes `compute` only when `deps` changes.
    pub fn use_memo<T, D>(&mut self, deps: D, compute: impl FnOnce(&D) -> T) -> T
    where
        T: Clone + 'static,
        D: PartialEq + 'static,
    {
        let (index, existing) = self.next_hook();
        if let Some(Hook::Memo {
            deps: old_deps,
            value: old_value,
        }) = existing
        {
            if let Some(cached) = old_value.downcast_ref::<T>() {
                if old_deps.downcast_ref::<D>() == Some(&deps) {
                    return cached.clone();
                }
            }
            let value = compute(&deps);
            *old_deps = Box::new(deps);
            *old_value = Box::new(value.clone());
            return value;
        }
        let value = compute(&deps);
        self.install(
            index,
            Hook::Memo {
                deps: Box::new(deps),
                value: Box::new(value.clone()),
            },
        );
        value
    }

    /// Runs `setup` after the frame commits, whenever `deps` changes.
    pub fn use_effect<D: PartialEq + 'static>(
        &mut self,
        deps: D,
        setup: impl FnOnce() -> Option<Cleanup> + 'static,
    ) {
        self.effect_hook(CommitPhase::Passive, deps, Box::new(setup));
    }

    /// Like [`use_effect`](Self::use_effect), run right after host mutations.
    pub fn use_layout_effect<D: PartialEq + 'static>(
        &mut self,
        deps: D,
        setup: impl FnOnce() -> Option<Cleanup> + 'static,
    ) {
        self.effect_hook(CommitPhase::Layout, deps, Box::new(setup));
    }

    /// Like [`use_effect`](Self::use_effect), run together with host mutations.
    pub fn use_insertion_effect<D: PartialEq + 'static>(
        &mut self,
        deps: D,
        setup: impl FnOnce() -> Option<Cleanup> + 'static,
    ) {
        self.effect_hook(CommitPhase::Mutation, deps, Box::new(setup));
    }

    fn effect_hook<D: PartialEq + 'static>(&mut self, phase: CommitPhase, deps: D, setup: Setup) {
        let (index, existing) = self.next_hook();
        let found = match existing {
            Some(Hook::Effect(effect)) if effect.phase == phase => Some(effect.clone()),
            _ => None,
        };
        let effect = match found {
            Some(effect) => {
                if effect.deps.borrow().downcast_ref::<D>() == Some(&deps) {
                    // A setup still waiting here was dropped with a failed frame.
                    if effect.setup.borrow().is_none() {
                        return;
                    }
                } else {
                    *effect.deps.borrow_mut() = Box::new(deps);
                    *effect.setup.borrow_mut() = Some(setup);
                }
                effect
            }
            None => {
                let effect = Rc::new(EffectHook {
                    phase,
                    deps: RefCell::new(Box::new(deps)),
                    setup: RefCell::new(Some(setup)),
                    cleanup: RefCell::new(None),
                    disposed: Cell::new(false),
                });
                self.install(index, Hook::Effect(effect.clone()));
                effect
            }
        };
        self.update.enqueue_effect(phase, effect);
    }

    /// Reads the nearest context value of type `T` from this scope or an
    /// ancestor.
    #[must_use]
    pub fn use_context<T: Clone + 'static>(&self) -> Option<T> {
        self.runtime().context::<T>(self.scope())
    }

    /// Provides `value` to this component and its descendants.
    pub fn provide_context<T: 'static>(&mut self, value: T) {
        self.runtime().provide_context(self.scope(), value);
    }

    /// Installs an error boundary for descendants of this component.
    ///
    /// The handler sees errors raised while rendering any descendant; it may
    /// call [`ErrorHandle::rethrow`] to pass the error further up.
    pub fn catch_error(&mut self, handler: impl Fn(&(dyn Error + 'static), &ErrorHandle) + 'static) {
        self.runtime()
            .set_error_boundary(self.scope(), Rc::new(handler));
    }

    /// A runtime-unique identifier that is stable across re-renders.
    pub fn use_id(&mut self) -> Rc<str> {
        let (index, existing) = self.next_hook();
        if let Some(Hook::Id(id)) = existing {
            return id.clone();
        }
        let runtime = self.runtime();
        let id: Rc<str> = runtime.format_identifier(runtime.next_identifier()).into();
        self.install(index, Hook::Id(id.clone()));
        id
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::{String, ToString};

    use futures::FutureExt as _;

    use super::*;
    use crate::component::Component;
    use crate::error::BoxError;
    use crate::lane::TaskPriority;
    use crate::task::TaskStatus;
    use crate::template::TemplateResult;
    use crate::testing::{BackendCall, TestBackend};
    use crate::value::Value;

    type SetterCell<T> = Rc<RefCell<Option<StateSetter<T>>>>;

    fn sync() -> UpdateOptions {
        UpdateOptions::default().with_flush_sync(true)
    }

    fn setter<T>(cell: &SetterCell<T>) -> StateSetter<T> {
        cell.borrow().clone().expect("component should have rendered")
    }

    struct Counter {
        setter: SetterCell<u32>,
    }

    impl Component for Counter {
        fn render(&self, ctx: &mut RenderContext<'_, '_>) -> Result<Value, BoxError> {
            let (count, set) = ctx.use_state(|| 0_u32);
            *self.setter.borrow_mut() = Some(set);
            Ok(Value::from(count))
        }
    }

    #[test]
    fn state_setter_schedules_a_render() {
        let (runtime, backend) = TestBackend::runtime();
        let (container, part) = backend.container();
        let slot = SetterCell::default();
        let root = runtime.create_root(
            Value::component(Counter {
                setter: slot.clone(),
            }),
            part,
        );
        root.mount();
        backend.run();
        assert_eq!(backend.html(container), "0");

        let set = setter(&slot);
        let handle = set.set(5);
        assert_eq!(set.get(), 5, "the cell updates before the render");
        backend.run();
        assert_eq!(backend.html(container), "5");
        assert_eq!(
            handle.finished.now_or_never().and_then(Result::ok),
            Some(TaskStatus::DONE)
        );

        set.update(|count| *count += 1);
        backend.run();
        assert_eq!(backend.html(container), "6");
    }

    struct Logged {
        log: Rc<RefCell<Vec<String>>>,
        setter: SetterCell<u32>,
    }

    impl Component for Logged {
        fn render(&self, ctx: &mut RenderContext<'_, '_>) -> Result<Value, BoxError> {
            let (count, set) = ctx.use_state(|| 0_u32);
            *self.setter.borrow_mut() = Some(set);
            let log = self.log.clone();
            ctx.use_effect(count, move || {
                log.borrow_mut().push(format!("setup {count}"));
                let cleanup: Cleanup =
                    Box::new(move || log.borrow_mut().push(format!("cleanup {count}")));
                Some(cleanup)
            });
            let log = self.log.clone();
            ctx.use_effect((), move || {
                log.borrow_mut().push("once".to_string());
                None
            });
            Ok(Value::from(count))
        }
    }

    #[test]
    fn effects_run_after_commit_and_clean_up() {
        let (runtime, backend) = TestBackend::runtime();
        let (container, part) = backend.container();
        let log = Rc::new(RefCell::new(Vec::new()));
        let slot = SetterCell::default();
        let root = runtime.create_root(
            Value::component(Logged {
                log: log.clone(),
                setter: slot.clone(),
            }),
            part,
        );
        root.mount();
        backend.run();
        assert_eq!(backend.html(container), "0");
        assert_eq!(*log.borrow(), ["setup 0", "once"]);
        assert!(
            backend.calls().contains(&BackendCall::RequestCallback(TaskPriority::Background)),
            "passive effects commit at background priority"
        );
        assert!(backend.calls().contains(&BackendCall::CommitEffects {
            phase: CommitPhase::Passive,
            count: 2
        }));

        let set = setter(&slot);
        set.set(1);
        backend.run();
        assert_eq!(*log.borrow(), ["setup 0", "once", "cleanup 0", "setup 1"]);

        root.unmount();
        backend.run();
        assert_eq!(backend.html(container), "");
        assert_eq!(
            *log.borrow(),
            ["setup 0", "once", "cleanup 0", "setup 1", "cleanup 1"]
        );

        let late = set.set(2);
        assert_eq!(late.scheduled.now_or_never(), Some(TaskStatus::CANCELED));
    }

    struct Phased {
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Component for Phased {
        fn render(&self, ctx: &mut RenderContext<'_, '_>) -> Result<Value, BoxError> {
            let log = self.log.clone();
            ctx.use_layout_effect((), move || {
                log.borrow_mut().push("layout");
                None
            });
            let log = self.log.clone();
            ctx.use_insertion_effect((), move || {
                log.borrow_mut().push("insertion");
                None
            });
            Ok(Value::from("x"))
        }
    }

    #[test]
    fn layout_and_insertion_effects_use_their_phases() {
        let (runtime, backend) = TestBackend::runtime();
        let (_, part) = backend.container();
        let log = Rc::new(RefCell::new(Vec::new()));
        runtime
            .create_root(Value::component(Phased { log: log.clone() }), part)
            .with_options(sync())
            .mount();

        assert_eq!(*log.borrow(), ["insertion", "layout"]);
        assert_eq!(
            backend.calls(),
            [
                BackendCall::CommitEffects {
                    phase: CommitPhase::Mutation,
                    count: 2
                },
                BackendCall::CommitEffects {
                    phase: CommitPhase::Layout,
                    count: 1
                },
            ]
        );
    }

    struct Memoized {
        computed: Rc<Cell<u32>>,
        seen: Rc<RefCell<Vec<(u32, u32, Rc<str>)>>>,
        setter: SetterCell<u32>,
    }

    impl Component for Memoized {
        fn render(&self, ctx: &mut RenderContext<'_, '_>) -> Result<Value, BoxError> {
            let (count, set) = ctx.use_state(|| 0_u32);
            *self.setter.borrow_mut() = Some(set);
            let computed = self.computed.clone();
            let doubled = ctx.use_memo(count / 2, |half| {
                computed.set(computed.get() + 1);
                half * 2
            });
            let renders = ctx.use_ref(|| 0_u32);
            *renders.borrow_mut() += 1;
            let id = ctx.use_id();
            self.seen
                .borrow_mut()
                .push((doubled, *renders.borrow(), id));
            Ok(Value::Null)
        }
    }

    #[test]
    fn memo_ref_and_id_survive_renders() {
        let (runtime, backend) = TestBackend::runtime();
        let (_, part) = backend.container();
        let computed = Rc::new(Cell::new(0));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let slot = SetterCell::default();
        runtime
            .create_root(
                Value::component(Memoized {
                    computed: computed.clone(),
                    seen: seen.clone(),
                    setter: slot.clone(),
                }),
                part,
            )
            .with_options(sync())
            .mount();
        let set = setter(&slot);
        set.set_with(1, sync());
        assert_eq!(computed.get(), 1, "same deps reuse the memo");
        set.set_with(2, sync());
        assert_eq!(computed.get(), 2);

        let seen = seen.borrow();
        let summary: Vec<(u32, u32)> = seen.iter().map(|(d, r, _)| (*d, *r)).collect();
        assert_eq!(summary, [(0, 1), (0, 2), (2, 3)]);
        assert!(seen.iter().all(|(_, _, id)| &**id == "id-1"));
    }

    struct Unstable {
        swapped: Rc<Cell<bool>>,
        inits: Rc<Cell<u32>>,
        updater: Rc<RefCell<Option<Updater>>>,
    }

    impl Component for Unstable {
        fn render(&self, ctx: &mut RenderContext<'_, '_>) -> Result<Value, BoxError> {
            *self.updater.borrow_mut() = Some(ctx.force_update());
            if self.swapped.get() {
                let inits = self.inits.clone();
                let _ = ctx.use_ref(move || {
                    inits.set(inits.get() + 1);
                    0_u32
                });
            } else {
                let _ = ctx.use_state(|| 0_u32);
            }
            Ok(Value::Null)
        }
    }

    #[test]
    fn changed_hook_order_reinitializes_the_entry() {
        let (runtime, backend) = TestBackend::runtime();
        let (_, part) = backend.container();
        let swapped = Rc::new(Cell::new(false));
        let inits = Rc::new(Cell::new(0));
        let updater = Rc::new(RefCell::new(None));
        runtime
            .create_root(
                Value::component(Unstable {
                    swapped: swapped.clone(),
                    inits: inits.clone(),
                    updater: updater.clone(),
                }),
                part,
            )
            .with_options(sync())
            .mount();

        swapped.set(true);
        let update = || {
            let updater = updater.borrow().clone().expect("component should have rendered");
            updater.schedule_with(sync())
        };
        update();
        assert_eq!(inits.get(), 1, "the state entry is replaced by a ref");
        update();
        assert_eq!(inits.get(), 1, "the ref is kept afterwards");
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Theme(&'static str);

    struct Provider {
        theme: &'static str,
        child: Value,
    }

    impl Component for Provider {
        fn render(&self, ctx: &mut RenderContext<'_, '_>) -> Result<Value, BoxError> {
            ctx.provide_context(Theme(self.theme));
            Ok(self.child.clone())
        }
    }

    struct Reader {
        seen: Rc<RefCell<Option<Theme>>>,
    }

    impl Component for Reader {
        fn render(&self, ctx: &mut RenderContext<'_, '_>) -> Result<Value, BoxError> {
            *self.seen.borrow_mut() = ctx.use_context::<Theme>();
            Ok(Value::Null)
        }
    }

    #[test]
    fn context_comes_from_the_nearest_provider() {
        let (runtime, backend) = TestBackend::runtime();
        let seen = Rc::new(RefCell::new(None));
        let reader = || {
            Value::component(Reader {
                seen: seen.clone(),
            })
        };

        let (_, part) = backend.container();
        runtime
            .create_root(reader(), part)
            .with_options(sync())
            .mount();
        assert_eq!(*seen.borrow(), None);

        let (_, part) = backend.container();
        let tree = Provider {
            theme: "dark",
            child: Value::component(Provider {
                theme: "light",
                child: reader(),
            }),
        };
        runtime
            .create_root(Value::component(tree), part)
            .with_options(sync())
            .mount();
        assert_eq!(*seen.borrow(), Some(Theme("light")));
    }

    struct Failing;

    impl Component for Failing {
        fn render(&self, _: &mut RenderContext<'_, '_>) -> Result<Value, BoxError> {
            Err("render failed".into())
        }
    }

    struct Once {
        runs: Rc<Cell<u32>>,
    }

    impl Component for Once {
        fn render(&self, ctx: &mut RenderContext<'_, '_>) -> Result<Value, BoxError> {
            let runs = self.runs.clone();
            ctx.use_effect((), move || {
                runs.set(runs.get() + 1);
                None
            });
            Ok(Value::Null)
        }
    }

    static PAIR: &[&str] = &["[", "|", "]"];

    #[test]
    fn effect_from_a_failed_frame_runs_with_the_next_commit() {
        let (runtime, backend) = TestBackend::runtime();
        let (container, part) = backend.container();
        let runs = Rc::new(Cell::new(0));
        let view = |second: Value| {
            TemplateResult::html(
                PAIR,
                [Value::component(Once { runs: runs.clone() }), second],
            )
        };
        let root = runtime
            .create_root(view(Value::component(Failing)), part)
            .with_options(sync());
        assert!(matches!(root.mount().finished.now_or_never(), Some(Err(_))));
        assert_eq!(runs.get(), 0, "nothing commits when the frame fails");

        root.update(view(Value::from("ok")));
        assert_eq!(runs.get(), 1);
        assert_eq!(backend.html(container), "[|ok]");

        root.update(view(Value::from("ok")));
        assert_eq!(runs.get(), 1, "equal deps do not run the effect again");
    }
}
