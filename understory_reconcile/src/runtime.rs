// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The runtime: task scheduling, the render loop and commit sequencing.
//!
//! ## Frames
//!
//! A frame takes one task (or every pending task, for the flush methods),
//! renders until no coroutine is left, then commits the effects queued during
//! render in three phases: mutation, layout and passive. Observers see the
//! stages as [`RuntimeEvent`]s.
//!
//! ## Errors
//!
//! A coroutine that fails to render is reported to the nearest error boundary
//! above its scope. A handled error aborts only the failing coroutine's
//! branch; the rest of the frame still commits. An unhandled error fails the
//! whole frame: nothing is committed and every task of the frame resolves
//! with the error. Bindings touched by the failed render keep their pending
//! changes, which commit with the next frame that binds them.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::error::Error;
use core::fmt;
use core::mem;

use futures_channel::oneshot;
use futures_util::FutureExt as _;
use futures_util::future::{self, LocalBoxFuture};
use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};
use understory_scope::{ScopeId, ScopeTree};

use crate::backend::{Backend, RequestCallbackOptions};
use crate::binding::Binding;
use crate::context::UpdateContext;
use crate::coroutine::Coroutine;
use crate::effect::{CommitPhase, Effect};
use crate::error::{BindError, BoxError, ErrorHandle, ErrorHandler, RenderError, render_trace};
use crate::frame::Frame;
use crate::lane::{Lanes, TaskPriority, UpdateOptions};
use crate::observer::{ObserverId, RuntimeEvent, RuntimeObserver};
use crate::part::Part;
use crate::root::Root;
use crate::slot::Slot;
use crate::task::{FinishedResult, Task, TaskStatus, UpdateHandle};
use crate::template::{
    StringsKey, Template, TemplateArg, TemplateMode, TemplateStrings, splice_segments,
};
use crate::value::Value;

/// Largest integer a double represents exactly; identifiers wrap after it.
pub const MAX_IDENTIFIER: u64 = (1 << 53) - 1;

const ANONYMOUS: &str = "<anonymous>";

/// Runtime configuration.
#[derive(Clone, Debug)]
pub struct RuntimeOptions {
    /// Prepended to identifiers from [`Runtime::format_identifier`].
    pub identifier_prefix: Cow<'static, str>,
    /// Yield to the host between render passes of asynchronous frames.
    pub yield_between_passes: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            identifier_prefix: Cow::Borrowed("id-"),
            yield_between_passes: true,
        }
    }
}

impl RuntimeOptions {
    /// Sets the identifier prefix.
    #[must_use]
    pub fn with_identifier_prefix(mut self, prefix: impl Into<Cow<'static, str>>) -> Self {
        self.identifier_prefix = prefix.into();
        self
    }

    /// Sets whether asynchronous frames yield between render passes.
    #[must_use]
    pub fn with_yield_between_passes(mut self, yield_between_passes: bool) -> Self {
        self.yield_between_passes = yield_between_passes;
        self
    }
}

struct CachedTemplate {
    /// Keeps expanded segments alive so their address is not reused.
    _strings: TemplateStrings,
    template: Rc<Template>,
}

#[derive(PartialEq, Eq, Hash)]
struct LiteralKey {
    strings: StringsKey,
    literals: Vec<Rc<str>>,
}

struct CachedLiterals {
    _strings: TemplateStrings,
    expanded: Rc<[Rc<str>]>,
}

struct RuntimeState {
    tasks: Vec<Task>,
    next_task_id: u64,
    next_frame_id: u64,
    identifier: u64,
    /// Which base lane new tasks use; flips when a frame starts.
    alternate: bool,
    /// Depth of render loops in progress.
    rendering: usize,
    deferred_sync: bool,
    observers: Vec<(ObserverId, Rc<dyn RuntimeObserver>)>,
    next_observer_id: u64,
    templates: HashMap<(StringsKey, TemplateMode), CachedTemplate>,
    literals: HashMap<LiteralKey, CachedLiterals>,
}

struct RuntimeInner {
    backend: Rc<dyn Backend>,
    options: RuntimeOptions,
    state: RefCell<RuntimeState>,
    scopes: RefCell<ScopeTree<ErrorHandler>>,
}

/// Schedules and runs updates against a [`Backend`].
///
/// Cloning is cheap and yields a handle to the same runtime.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Runtime");
        s.field("options", &self.inner.options);
        if let Ok(state) = self.inner.state.try_borrow() {
            s.field("pending_tasks", &state.tasks.len())
                .field("rendering", &(state.rendering > 0));
        }
        s.finish_non_exhaustive()
    }
}

/// A weak handle to a [`Runtime`].
#[derive(Clone, Debug, Default)]
pub struct WeakRuntime(Weak<RuntimeInner>);

impl WeakRuntime {
    /// Returns the runtime if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Runtime> {
        self.0.upgrade().map(|inner| Runtime { inner })
    }
}

/// Which tasks a frame takes.
#[derive(Clone, Copy)]
enum Selection {
    Task(u64),
    All,
}

struct RunningTask {
    id: u64,
    status: TaskStatus,
    finished: oneshot::Sender<FinishedResult>,
}

struct FrameRun {
    frame: Frame,
    tasks: Vec<RunningTask>,
}

impl Runtime {
    /// Creates a runtime with default options.
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self::with_options(backend, RuntimeOptions::default())
    }

    /// Creates a runtime.
    pub fn with_options(backend: impl Backend + 'static, options: RuntimeOptions) -> Self {
        Self::from_rc(Rc::new(backend), options)
    }

    /// Creates a runtime over a shared backend.
    pub fn from_rc(backend: Rc<dyn Backend>, options: RuntimeOptions) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                backend,
                options,
                state: RefCell::new(RuntimeState {
                    tasks: Vec::new(),
                    next_task_id: 0,
                    next_frame_id: 0,
                    identifier: 0,
                    alternate: false,
                    rendering: 0,
                    deferred_sync: false,
                    observers: Vec::new(),
                    next_observer_id: 0,
                    templates: HashMap::new(),
                    literals: HashMap::new(),
                }),
                scopes: RefCell::new(ScopeTree::new()),
            }),
        }
    }

    /// A weak handle to this runtime.
    #[must_use]
    pub fn downgrade(&self) -> WeakRuntime {
        WeakRuntime(Rc::downgrade(&self.inner))
    }

    /// The backend.
    #[must_use]
    pub fn backend(&self) -> &dyn Backend {
        &*self.inner.backend
    }

    /// The options this runtime was created with.
    #[must_use]
    pub fn options(&self) -> &RuntimeOptions {
        &self.inner.options
    }

    /// Number of tasks waiting for a frame.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.inner.state.borrow().tasks.len()
    }

    /// Creates a root that renders `value` at `part`.
    pub fn create_root(&self, value: impl Into<Value>, part: Part) -> Root {
        Root::new(self.clone(), value.into(), part)
    }

    // --- scheduling ---

    /// Requests a render of `coroutine`.
    ///
    /// A request with the same coroutine and the same lanes as a task that
    /// has not started yet is folded into it: the returned handle is
    /// scheduled with that task and finishes as canceled.
    pub fn schedule_update(
        &self,
        coroutine: Rc<dyn Coroutine>,
        options: UpdateOptions,
    ) -> UpdateHandle {
        let priority = options
            .priority
            .unwrap_or_else(|| self.inner.backend.current_priority());
        let (id, lanes, handle) = {
            let mut state = self.inner.state.borrow_mut();
            let lanes = Lanes::for_update(priority, &options, state.alternate);
            if let Some(task) = state
                .tasks
                .iter_mut()
                .find(|task| task.lanes == lanes && task.same_coroutine(&coroutine))
            {
                trace!(task = task.id, ?lanes, "update folded into pending task");
                return task.duplicate();
            }
            state.next_task_id += 1;
            let id = state.next_task_id;
            let (task, handle) = Task::new(id, coroutine.clone(), lanes);
            state.tasks.push(task);
            (id, lanes, handle)
        };
        coroutine.add_pending_lanes(lanes);
        trace!(task = id, ?lanes, "update scheduled");
        if options.trigger_flush {
            if options.flush_sync {
                self.flush_sync();
            } else {
                self.dispatch(id, priority);
            }
        }
        handle
    }

    fn dispatch(&self, id: u64, priority: TaskPriority) {
        let runtime = self.clone();
        // Completion is tracked through the task's own handle.
        let _ = self.inner.backend.request_callback(
            Box::new(move || runtime.run_task(id).boxed_local()),
            RequestCallbackOptions::new(priority),
        );
    }

    async fn run_task(self, id: u64) {
        if let Some(run) = self.begin_frame(Selection::Task(id)) {
            self.run_frame_async(run).await;
        }
    }

    /// Runs every pending task in one synchronous frame.
    ///
    /// Called while a frame is rendering, this only records the request; the
    /// flush happens once the current frame ends.
    pub fn flush_sync(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.rendering > 0 {
                warn!("flush_sync called while rendering; deferring until the frame ends");
                state.deferred_sync = true;
                return;
            }
        }
        if let Some(run) = self.begin_frame(Selection::All) {
            self.run_frame_sync(run);
        }
    }

    /// Runs every pending task in one asynchronous frame.
    pub async fn flush_async(&self) {
        if let Some(run) = self.begin_frame(Selection::All) {
            self.run_frame_async(run).await;
        }
    }

    fn begin_frame(&self, selection: Selection) -> Option<FrameRun> {
        let (frame_id, taken) = {
            let mut state = self.inner.state.borrow_mut();
            let taken = match selection {
                Selection::Task(id) => {
                    let index = state.tasks.iter().position(|task| task.id == id)?;
                    alloc::vec![state.tasks.remove(index)]
                }
                Selection::All => mem::take(&mut state.tasks),
            };
            if taken.is_empty() {
                return None;
            }
            state.alternate = !state.alternate;
            state.next_frame_id += 1;
            (state.next_frame_id, taken)
        };

        let lanes = taken
            .iter()
            .fold(Lanes::empty(), |lanes, task| lanes | task.lanes);
        let mut frame = Frame::new(frame_id, lanes);
        let mut tasks = Vec::with_capacity(taken.len());
        for task in taken {
            let id = task.id;
            let coroutine = task.coroutine.clone();
            let stale = !coroutine.pending_lanes().intersects(task.lanes);
            let merged = frame
                .pending_coroutines
                .iter()
                .any(|c| core::ptr::addr_eq(Rc::as_ptr(c), Rc::as_ptr(&coroutine)));
            if stale || merged {
                trace!(task = id, stale, merged, "task canceled at frame start");
                let finished = task.accept(TaskStatus::CANCELED);
                let _ = finished.send(Ok(TaskStatus::CANCELED));
                continue;
            }
            frame.pending_coroutines.push(coroutine);
            tasks.push(RunningTask {
                id,
                status: TaskStatus::DONE,
                finished: task.accept(TaskStatus::ACCEPTED),
            });
        }
        if tasks.is_empty() {
            return None;
        }
        Some(FrameRun { frame, tasks })
    }

    fn start_frame(&self, frame: &Frame) {
        debug!(frame = frame.id(), lanes = ?frame.lanes(), "update started");
        self.notify(&RuntimeEvent::UpdateStart {
            id: frame.id(),
            lanes: frame.lanes(),
        });
        self.notify(&RuntimeEvent::RenderStart { id: frame.id() });
    }

    fn run_frame_sync(&self, run: FrameRun) {
        let FrameRun { mut frame, tasks } = run;
        self.start_frame(&frame);
        let mut aborted = false;
        let outcome = loop {
            match self.render_pass(&mut frame) {
                Err(error) => break Err(error),
                Ok(caught) => {
                    aborted |= caught;
                    if frame.pending_coroutines.is_empty() {
                        break Ok(());
                    }
                }
            }
        };
        match outcome {
            Ok(()) => {
                self.notify(&RuntimeEvent::RenderEnd { id: frame.id() });
                for phase in CommitPhase::ALL {
                    let effects = frame.effects_mut(phase).take();
                    self.commit_phase(frame.id(), &effects, phase);
                }
                self.finish_frame(frame.id(), tasks, aborted);
            }
            Err(error) => self.fail_frame(&mut frame, tasks, error),
        }
        self.after_frame();
    }

    async fn run_frame_async(&self, run: FrameRun) {
        let FrameRun { mut frame, tasks } = run;
        self.start_frame(&frame);
        let mut aborted = false;
        let outcome = loop {
            match self.render_pass(&mut frame) {
                Err(error) => break Err(error),
                Ok(caught) => {
                    aborted |= caught;
                    if frame.pending_coroutines.is_empty() {
                        break Ok(());
                    }
                    if self.inner.options.yield_between_passes {
                        self.inner.backend.yield_to_main().await;
                    }
                }
            }
        };
        match outcome {
            Ok(()) => {
                self.notify(&RuntimeEvent::RenderEnd { id: frame.id() });
                self.commit_async(&mut frame).await;
                self.finish_frame(frame.id(), tasks, aborted);
            }
            Err(error) => self.fail_frame(&mut frame, tasks, error),
        }
        self.after_frame();
    }

    /// Resumes every coroutine queued so far.
    ///
    /// Returns whether an error boundary handled a failure, or the first
    /// unhandled error. Siblings of a failing coroutine still run.
    fn render_pass(&self, frame: &mut Frame) -> Result<bool, RenderError> {
        let coroutines = mem::take(&mut frame.pending_coroutines);
        self.inner.state.borrow_mut().rendering += 1;
        let mut caught = false;
        let mut failure = None;
        for coroutine in coroutines {
            if !coroutine.pending_lanes().intersects(frame.lanes()) {
                continue;
            }
            let mut ctx = UpdateContext::new(self, frame, coroutine.scope());
            if let Err(error) = coroutine.resume(&mut ctx) {
                match self.handle_render_error(coroutine.scope(), error) {
                    Ok(()) => caught = true,
                    Err(error) => {
                        if failure.is_none() {
                            failure = Some(error);
                        }
                    }
                }
            }
        }
        self.inner.state.borrow_mut().rendering -= 1;
        match failure {
            Some(error) => Err(error),
            None => Ok(caught),
        }
    }

    /// Offers an error to the boundaries above `scope`, innermost first.
    fn handle_render_error(
        &self,
        scope: Option<ScopeId>,
        error: BoxError,
    ) -> Result<(), RenderError> {
        let cause: Rc<dyn Error> = Rc::from(error);
        let (name, trace, handlers) = {
            let scopes = self.inner.scopes.borrow();
            match scope.filter(|scope| scopes.is_alive(*scope)) {
                Some(scope) => {
                    let name = String::from(scopes.name(scope).unwrap_or(ANONYMOUS));
                    let handlers: SmallVec<[ErrorHandler; 4]> = scopes
                        .parent(scope)
                        .map(|parent| {
                            scopes
                                .boundaries(parent)
                                .map(|(_, handler)| handler.clone())
                                .collect()
                        })
                        .unwrap_or_default();
                    (Cow::Owned(name), render_trace(&scopes, scope), handlers)
                }
                None => (
                    Cow::Borrowed(ANONYMOUS),
                    format!("{ANONYMOUS} <- ERROR occurred here!"),
                    SmallVec::new(),
                ),
            }
        };
        for handler in handlers {
            let handle = ErrorHandle::new();
            handler(&*cause, &handle);
            if !handle.is_rethrown() {
                debug!(coroutine = %name, "render error handled by boundary");
                return Ok(());
            }
        }
        Err(RenderError::new(name, trace, cause))
    }

    async fn commit_async(&self, frame: &mut Frame) {
        let id = frame.id();
        let mutation = frame.effects_mut(CommitPhase::Mutation).take();
        let layout = frame.effects_mut(CommitPhase::Layout).take();
        let passive = frame.effects_mut(CommitPhase::Passive).take();
        if frame.lanes().contains(Lanes::VIEW_TRANSITION) {
            if !mutation.is_empty() || !layout.is_empty() {
                let runtime = self.clone();
                self.inner
                    .backend
                    .start_view_transition(Box::new(move || {
                        runtime.commit_phase(id, &mutation, CommitPhase::Mutation);
                        runtime.commit_phase(id, &layout, CommitPhase::Layout);
                    }))
                    .await;
            }
        } else {
            if !mutation.is_empty() {
                self.request_commit(id, mutation, CommitPhase::Mutation, TaskPriority::UserBlocking)
                    .await;
            }
            if !layout.is_empty() {
                self.request_commit(id, layout, CommitPhase::Layout, TaskPriority::UserBlocking)
                    .await;
            }
        }
        if !passive.is_empty() {
            self.request_commit(id, passive, CommitPhase::Passive, TaskPriority::Background)
                .await;
        }
    }

    fn request_commit(
        &self,
        id: u64,
        effects: Vec<Rc<dyn Effect>>,
        phase: CommitPhase,
        priority: TaskPriority,
    ) -> LocalBoxFuture<'static, ()> {
        let runtime = self.clone();
        self.inner.backend.request_callback(
            Box::new(move || {
                runtime.commit_phase(id, &effects, phase);
                future::ready(()).boxed_local()
            }),
            RequestCallbackOptions::new(priority),
        )
    }

    fn commit_phase(&self, id: u64, effects: &[Rc<dyn Effect>], phase: CommitPhase) {
        if effects.is_empty() {
            return;
        }
        trace!(frame = id, %phase, effects = effects.len(), "commit");
        self.notify(&RuntimeEvent::CommitStart {
            id,
            phase,
            effects: effects.len(),
        });
        self.inner.backend.commit_effects(effects, phase);
        self.notify(&RuntimeEvent::CommitEnd { id, phase });
    }

    fn finish_frame(&self, id: u64, tasks: Vec<RunningTask>, aborted: bool) {
        debug!(frame = id, aborted, "update finished");
        self.notify(&RuntimeEvent::UpdateEnd { id });
        for task in tasks {
            let status = if aborted {
                TaskStatus::ABORTED
            } else {
                task.status
            };
            trace!(task = task.id, ?status, "task finished");
            let _ = task.finished.send(Ok(status));
        }
    }

    fn fail_frame(&self, frame: &mut Frame, tasks: Vec<RunningTask>, error: RenderError) {
        let id = frame.id();
        warn!(frame = id, coroutine = error.coroutine(), "update failed: {}", error.cause());
        frame.pending_coroutines.clear();
        for phase in CommitPhase::ALL {
            for effect in frame.effects_mut(phase).take() {
                effect.discard();
            }
        }
        self.notify(&RuntimeEvent::UpdateFailure {
            id,
            error: error.clone(),
        });
        for task in tasks {
            let _ = task.finished.send(Err(error.clone()));
        }
    }

    fn after_frame(&self) {
        let deferred = mem::take(&mut self.inner.state.borrow_mut().deferred_sync);
        if deferred {
            self.flush_sync();
        }
    }

    // --- observers ---

    /// Registers an observer for lifecycle events.
    pub fn add_observer(&self, observer: impl RuntimeObserver + 'static) -> ObserverId {
        let mut state = self.inner.state.borrow_mut();
        state.next_observer_id += 1;
        let id = ObserverId(state.next_observer_id);
        state.observers.push((id, Rc::new(observer)));
        id
    }

    /// Unregisters an observer. Returns `false` if it was not registered.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut state = self.inner.state.borrow_mut();
        let before = state.observers.len();
        state.observers.retain(|(other, _)| *other != id);
        state.observers.len() != before
    }

    fn notify(&self, event: &RuntimeEvent) {
        let observers: SmallVec<[Rc<dyn RuntimeObserver>; 4]> = self
            .inner
            .state
            .borrow()
            .observers
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer.on_event(event);
        }
    }

    // --- identifiers ---

    /// Returns the next identifier, wrapping from [`MAX_IDENTIFIER`] to 1.
    pub fn next_identifier(&self) -> u64 {
        let mut state = self.inner.state.borrow_mut();
        state.identifier = if state.identifier >= MAX_IDENTIFIER {
            1
        } else {
            state.identifier + 1
        };
        state.identifier
    }

    /// Formats an identifier with the configured prefix.
    #[must_use]
    pub fn format_identifier(&self, id: u64) -> String {
        format!("{}{id}", self.inner.options.identifier_prefix)
    }

    #[cfg(test)]
    pub(crate) fn set_identifier(&self, identifier: u64) {
        self.inner.state.borrow_mut().identifier = identifier;
    }

    // --- templates ---

    /// Looks up or builds the template for `strings`.
    ///
    /// Templates are cached by the identity of `strings`, so the same static
    /// segments always yield the same [`Template`]. The cache keeps every
    /// entry until [`clear_template_caches`](Self::clear_template_caches).
    pub fn resolve_template(
        &self,
        strings: &TemplateStrings,
        mode: TemplateMode,
    ) -> Result<Rc<Template>, BindError> {
        let key = (strings.key(), mode);
        if let Some(cached) = self.inner.state.borrow().templates.get(&key) {
            return Ok(cached.template.clone());
        }
        let template = Rc::new(self.inner.backend.parse_template(strings, mode)?);
        trace!(holes = template.holes().len(), ?mode, "template parsed");
        self.inner.state.borrow_mut().templates.insert(
            key,
            CachedTemplate {
                _strings: strings.clone(),
                template: template.clone(),
            },
        );
        Ok(template)
    }

    /// Splices literal arguments into the static segments.
    ///
    /// Returns the segments to build the template from and the remaining
    /// dynamic values. Without literals the segments are returned unchanged;
    /// otherwise the expansion is cached by segment identity and literal
    /// content, so equal inputs share one expanded array.
    ///
    /// Each distinct literal combination stays cached, together with the
    /// template built from it, for the lifetime of the runtime unless
    /// [`clear_template_caches`](Self::clear_template_caches) is called.
    /// Literals drawn from an unbounded set grow both caches without limit.
    pub fn expand_literals(
        &self,
        strings: &TemplateStrings,
        args: Vec<TemplateArg>,
    ) -> Result<(TemplateStrings, Vec<Value>), BindError> {
        if args.len() + 1 != strings.len() {
            return Err(BindError::HoleCountMismatch {
                expected: strings.len().saturating_sub(1),
                actual: args.len(),
            });
        }
        let literals: Vec<Rc<str>> = args
            .iter()
            .filter_map(|arg| match arg {
                TemplateArg::Literal(text) => Some(text.clone()),
                TemplateArg::Value(_) => None,
            })
            .collect();
        if literals.is_empty() {
            let values = args
                .into_iter()
                .filter_map(|arg| match arg {
                    TemplateArg::Value(value) => Some(value),
                    TemplateArg::Literal(_) => None,
                })
                .collect();
            return Ok((strings.clone(), values));
        }
        let key = LiteralKey {
            strings: strings.key(),
            literals,
        };
        let cached = self
            .inner
            .state
            .borrow()
            .literals
            .get(&key)
            .map(|cached| cached.expanded.clone());
        let expanded = match cached {
            Some(expanded) => expanded,
            None => {
                let expanded: Rc<[Rc<str>]> = splice_segments(strings, &args).into();
                self.inner.state.borrow_mut().literals.insert(
                    key,
                    CachedLiterals {
                        _strings: strings.clone(),
                        expanded: expanded.clone(),
                    },
                );
                expanded
            }
        };
        let values = args
            .into_iter()
            .filter_map(|arg| match arg {
                TemplateArg::Value(value) => Some(value),
                TemplateArg::Literal(_) => None,
            })
            .collect();
        Ok((TemplateStrings::Expanded(expanded), values))
    }

    /// Drops every cached template and literal expansion.
    ///
    /// Bindings compare templates by identity, so content bound before the
    /// call is rebuilt rather than rebound the next time it renders.
    pub fn clear_template_caches(&self) {
        let mut state = self.inner.state.borrow_mut();
        trace!(
            templates = state.templates.len(),
            literals = state.literals.len(),
            "template caches cleared"
        );
        state.templates.clear();
        state.literals.clear();
    }

    // --- bindings ---

    /// Picks a binding for `value` at `part`.
    pub fn resolve_binding(&self, value: Value, part: Part) -> Result<Rc<Binding>, BindError> {
        Binding::resolve(value, part, &*self.inner.backend)
    }

    /// Picks a binding and a slot policy for `value` at `part`.
    pub fn resolve_slot(&self, value: Value, part: Part) -> Result<Slot, BindError> {
        let slot_type = self.inner.backend.resolve_slot_type(&value, &part);
        let binding = self.resolve_binding(value, part)?;
        Ok(Slot::new(binding, slot_type))
    }

    // --- scopes ---

    /// Creates a scope under `parent`.
    pub fn create_scope(
        &self,
        parent: Option<ScopeId>,
        name: impl Into<Cow<'static, str>>,
    ) -> ScopeId {
        self.inner.scopes.borrow_mut().insert(parent, name)
    }

    /// Removes a scope. Returns `false` if it was already gone.
    pub fn remove_scope(&self, scope: ScopeId) -> bool {
        self.inner.scopes.borrow_mut().remove(scope)
    }

    /// Reads the nearest context value of type `T` from `scope` upward.
    #[must_use]
    pub fn context<T: Clone + 'static>(&self, scope: ScopeId) -> Option<T> {
        self.inner.scopes.borrow().context::<T>(scope).cloned()
    }

    /// Provides a context value at `scope`.
    pub fn provide_context<T: 'static>(&self, scope: ScopeId, value: T) -> bool {
        self.inner.scopes.borrow_mut().set_context(scope, value)
    }

    /// Installs an error boundary at `scope`, returning the previous one.
    pub fn set_error_boundary(&self, scope: ScopeId, handler: ErrorHandler) -> Option<ErrorHandler> {
        self.inner.scopes.borrow_mut().set_boundary(scope, handler)
    }

    /// Removes the error boundary at `scope`.
    pub fn clear_error_boundary(&self, scope: ScopeId) -> Option<ErrorHandler> {
        self.inner.scopes.borrow_mut().clear_boundary(scope)
    }
}
