// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The backend contract: everything the runtime needs from its host.

use alloc::boxed::Box;
use alloc::rc::Rc;

use futures_util::future::LocalBoxFuture;

use crate::effect::{CommitPhase, Effect};
use crate::error::BindError;
use crate::host::HostTree;
use crate::lane::TaskPriority;
use crate::part::{Part, PartKind};
use crate::slot::SlotType;
use crate::template::{Template, TemplateMode, TemplateStrings};
use crate::value::{Value, ValueKind};

/// Work handed to [`Backend::request_callback`].
///
/// The host calls it once and drives the returned future to completion.
pub type Callback = Box<dyn FnOnce() -> LocalBoxFuture<'static, ()>>;

/// Options for [`Backend::request_callback`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestCallbackOptions {
    /// Host priority of the callback.
    pub priority: TaskPriority,
}

impl RequestCallbackOptions {
    /// Options with the given priority.
    #[must_use]
    pub const fn new(priority: TaskPriority) -> Self {
        Self { priority }
    }
}

/// How a plain value binds to a part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Written with [`HostTree::set_attribute`].
    Attribute,
    /// Written with [`HostTree::set_property`].
    Property,
    /// Written with [`HostTree::set_event_listener`].
    Event,
    /// Rendered as a text node at a child position.
    Node,
    /// Written with [`HostTree::set_text`].
    Text,
}

impl PrimitiveType {
    /// The default mapping from part kind to primitive.
    ///
    /// Event parts only take listeners (or null), and element parts only take
    /// directives.
    pub fn resolve(value: &Value, part: &Part) -> Result<Self, BindError> {
        match part.kind() {
            PartKind::Attribute => Ok(Self::Attribute),
            PartKind::Property => Ok(Self::Property),
            PartKind::Event => match value.kind() {
                ValueKind::Listener | ValueKind::Null => Ok(Self::Event),
                kind => Err(BindError::PartMismatch {
                    value: kind,
                    part: PartKind::Event,
                }),
            },
            PartKind::ChildNode => Ok(Self::Node),
            PartKind::Text => Ok(Self::Text),
            PartKind::Element => Err(BindError::NotADirective {
                value: value.kind(),
                part: PartKind::Element,
            }),
        }
    }
}

/// Host services used by the runtime.
///
/// Scheduling methods return futures that only observe completion: dropping
/// one never cancels the work, the host runs it regardless.
pub trait Backend {
    /// The host tree bindings write to.
    fn host(&self) -> &dyn HostTree;

    /// Commits one phase of effects, in order.
    ///
    /// Called once per non-empty phase. Panics raised by effects are left
    /// to the host.
    fn commit_effects(&self, effects: &[Rc<dyn Effect>], phase: CommitPhase) {
        let _ = phase;
        let host = self.host();
        for effect in effects {
            effect.commit(host);
        }
    }

    /// Runs `callback` at the requested priority.
    fn request_callback(
        &self,
        callback: Callback,
        options: RequestCallbackOptions,
    ) -> LocalBoxFuture<'static, ()>;

    /// Runs `callback` inside a view transition.
    fn start_view_transition(&self, callback: Box<dyn FnOnce()>) -> LocalBoxFuture<'static, ()>;

    /// Gives the host a chance to handle other work.
    fn yield_to_main(&self) -> LocalBoxFuture<'static, ()>;

    /// Priority used when an update does not specify one, typically derived
    /// from the event being handled.
    fn current_priority(&self) -> TaskPriority {
        TaskPriority::UserVisible
    }

    /// Builds a template from string segments.
    ///
    /// The default builds a markup-free template; see
    /// [`Template::from_segments`].
    fn parse_template(
        &self,
        strings: &TemplateStrings,
        mode: TemplateMode,
    ) -> Result<Template, BindError> {
        Ok(Template::from_segments(strings, mode))
    }

    /// Chooses the primitive binding for a plain value.
    fn resolve_primitive(&self, value: &Value, part: &Part) -> Result<PrimitiveType, BindError> {
        PrimitiveType::resolve(value, part)
    }

    /// Chooses the slot strategy for a hole.
    fn resolve_slot_type(&self, value: &Value, part: &Part) -> SlotType {
        SlotType::for_part(value, part)
    }
}
