// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The context passed to coroutines and bindings during a render pass.

use alloc::rc::Rc;

use understory_scope::ScopeId;

use crate::binding::Binding;
use crate::component::ComponentElement;
use crate::coroutine::Coroutine;
use crate::effect::{CommitPhase, Effect};
use crate::error::BindError;
use crate::frame::Frame;
use crate::host::HostTree;
use crate::lane::{Lanes, UpdateOptions};
use crate::part::Part;
use crate::runtime::Runtime;
use crate::slot::Slot;
use crate::task::UpdateHandle;
use crate::template::{Template, TemplateMode, TemplateStrings};
use crate::value::Value;

/// Access to the runtime, the current frame and the current scope.
#[derive(Debug)]
pub struct UpdateContext<'a> {
    runtime: &'a Runtime,
    frame: &'a mut Frame,
    scope: Option<ScopeId>,
}

impl<'a> UpdateContext<'a> {
    pub(crate) fn new(runtime: &'a Runtime, frame: &'a mut Frame, scope: Option<ScopeId>) -> Self {
        Self {
            runtime,
            frame,
            scope,
        }
    }

    /// The runtime driving this frame.
    #[must_use]
    pub fn runtime(&self) -> &'a Runtime {
        self.runtime
    }

    /// The host tree.
    #[must_use]
    pub fn host(&self) -> &'a dyn HostTree {
        self.runtime.backend().host()
    }

    /// The frame being rendered.
    #[must_use]
    pub fn frame(&self) -> &Frame {
        self.frame
    }

    /// The lanes being flushed.
    #[must_use]
    pub fn lanes(&self) -> Lanes {
        self.frame.lanes()
    }

    /// The scope new components are created under.
    #[must_use]
    pub fn scope(&self) -> Option<ScopeId> {
        self.scope
    }

    /// Reborrows this context with a different scope.
    pub fn with_scope(&mut self, scope: Option<ScopeId>) -> UpdateContext<'_> {
        UpdateContext {
            runtime: self.runtime,
            frame: &mut *self.frame,
            scope,
        }
    }

    /// Queues a coroutine for the next render pass of this frame.
    pub fn enqueue_coroutine(&mut self, coroutine: Rc<dyn Coroutine>) {
        self.frame.pending_coroutines.push(coroutine);
    }

    /// Queues an effect for `phase`.
    pub fn enqueue_effect(&mut self, phase: CommitPhase, effect: Rc<dyn Effect>) {
        self.frame.effects_mut(phase).push(effect);
    }

    /// Queues a host mutation.
    pub fn enqueue_mutation_effect(&mut self, effect: Rc<dyn Effect>) {
        self.enqueue_effect(CommitPhase::Mutation, effect);
    }

    /// Queues a layout effect.
    pub fn enqueue_layout_effect(&mut self, effect: Rc<dyn Effect>) {
        self.enqueue_effect(CommitPhase::Layout, effect);
    }

    /// Queues a passive effect.
    pub fn enqueue_passive_effect(&mut self, effect: Rc<dyn Effect>) {
        self.enqueue_effect(CommitPhase::Passive, effect);
    }

    /// Picks a binding for `value` at `part`.
    pub fn resolve_binding(&self, value: Value, part: Part) -> Result<Rc<Binding>, BindError> {
        self.runtime.resolve_binding(value, part)
    }

    /// Picks a binding and a slot policy for `value` at `part`.
    pub fn resolve_slot(&self, value: Value, part: Part) -> Result<Slot, BindError> {
        self.runtime.resolve_slot(value, part)
    }

    /// Looks up or builds the template for `strings`.
    pub fn resolve_template(
        &self,
        strings: &TemplateStrings,
        mode: TemplateMode,
    ) -> Result<Rc<Template>, BindError> {
        self.runtime.resolve_template(strings, mode)
    }

    /// Binds a component at `part` and connects it, so that it renders in
    /// this frame.
    pub fn render_component(
        &mut self,
        element: ComponentElement,
        part: Part,
    ) -> Result<Rc<Binding>, BindError> {
        let binding = self.resolve_binding(Value::Component(element), part)?;
        binding.connect(self)?;
        Ok(binding)
    }

    /// Schedules another update; see [`Runtime::schedule_update`].
    pub fn schedule_update(
        &self,
        coroutine: Rc<dyn Coroutine>,
        options: UpdateOptions,
    ) -> UpdateHandle {
        self.runtime.schedule_update(coroutine, options)
    }
}
