// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A deterministic backend for unit tests.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::future::Future;

use futures::FutureExt as _;
use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::{self, LocalBoxFuture};
use futures::task::LocalSpawnExt as _;

use crate::backend::{Backend, Callback, RequestCallbackOptions};
use crate::effect::{CommitPhase, Effect};
use crate::host::{HostTree, MemoryHost, NodeId};
use crate::lane::TaskPriority;
use crate::part::Part;
use crate::runtime::{Runtime, RuntimeOptions};
use crate::template::TemplateMode;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum BackendCall {
    RequestCallback(TaskPriority),
    StartViewTransition,
    YieldToMain,
    CommitEffects { phase: CommitPhase, count: usize },
}

/// Runs host callbacks on a local pool, most urgent first.
pub(crate) struct TestBackend {
    host: MemoryHost,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    queue: RefCell<Vec<(TaskPriority, Callback, oneshot::Sender<()>)>>,
    calls: RefCell<Vec<BackendCall>>,
    priority: Cell<TaskPriority>,
}

impl TestBackend {
    pub(crate) fn new() -> Rc<Self> {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Rc::new(Self {
            host: MemoryHost::new(),
            pool: RefCell::new(pool),
            spawner,
            queue: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
            priority: Cell::new(TaskPriority::UserVisible),
        })
    }

    /// A runtime over a fresh backend.
    pub(crate) fn runtime() -> (Runtime, Rc<Self>) {
        Self::runtime_with(RuntimeOptions::default())
    }

    pub(crate) fn runtime_with(options: RuntimeOptions) -> (Runtime, Rc<Self>) {
        let backend = Self::new();
        let runtime = Runtime::from_rc(backend.clone(), options);
        (runtime, backend)
    }

    pub(crate) fn memory(&self) -> &MemoryHost {
        &self.host
    }

    /// Creates a `<div>` holding a single anchor and returns both.
    ///
    /// Operations recorded so far are cleared.
    pub(crate) fn container(&self) -> (NodeId, Part) {
        let container = self.host.create_element("div", TemplateMode::Html);
        let anchor = self.host.create_comment("");
        self.host.append_child(container, anchor);
        self.host.take_ops();
        (container, Part::ChildNode { anchor })
    }

    pub(crate) fn html(&self, node: NodeId) -> alloc::string::String {
        self.host.inner_html(node)
    }

    pub(crate) fn set_priority(&self, priority: TaskPriority) {
        self.priority.set(priority);
    }

    pub(crate) fn calls(&self) -> Vec<BackendCall> {
        self.calls.borrow().clone()
    }

    pub(crate) fn take_calls(&self) -> Vec<BackendCall> {
        core::mem::take(&mut *self.calls.borrow_mut())
    }

    pub(crate) fn pending_callbacks(&self) -> usize {
        self.queue.borrow().len()
    }

    pub(crate) fn spawn(&self, future: impl Future<Output = ()> + 'static) {
        // The pool only fails to spawn after it was dropped.
        let _ = self.spawner.spawn_local(future);
    }

    /// Runs spawned futures and queued callbacks until nothing is left.
    pub(crate) fn run(&self) {
        loop {
            self.pool.borrow_mut().run_until_stalled();
            let next = {
                let mut queue = self.queue.borrow_mut();
                let index = queue
                    .iter()
                    .enumerate()
                    .min_by_key(|(i, (priority, _, _))| (*priority, *i))
                    .map(|(i, _)| i);
                index.map(|i| queue.remove(i))
            };
            let Some((_, callback, done)) = next else {
                break;
            };
            let work = callback();
            self.spawn(async move {
                work.await;
                let _ = done.send(());
            });
        }
    }
}

impl Backend for TestBackend {
    fn host(&self) -> &dyn HostTree {
        &self.host
    }

    fn commit_effects(&self, effects: &[Rc<dyn Effect>], phase: CommitPhase) {
        self.calls.borrow_mut().push(BackendCall::CommitEffects {
            phase,
            count: effects.len(),
        });
        for effect in effects {
            effect.commit(&self.host);
        }
    }

    fn request_callback(
        &self,
        callback: Callback,
        options: RequestCallbackOptions,
    ) -> LocalBoxFuture<'static, ()> {
        self.calls
            .borrow_mut()
            .push(BackendCall::RequestCallback(options.priority));
        let (tx, rx) = oneshot::channel();
        self.queue
            .borrow_mut()
            .push((options.priority, callback, tx));
        async move {
            let _ = rx.await;
        }
        .boxed_local()
    }

    fn start_view_transition(&self, callback: Box<dyn FnOnce()>) -> LocalBoxFuture<'static, ()> {
        self.calls.borrow_mut().push(BackendCall::StartViewTransition);
        callback();
        future::ready(()).boxed_local()
    }

    fn yield_to_main(&self) -> LocalBoxFuture<'static, ()> {
        self.calls.borrow_mut().push(BackendCall::YieldToMain);
        future::ready(()).boxed_local()
    }

    fn current_priority(&self) -> TaskPriority {
        self.priority.get()
    }
}
