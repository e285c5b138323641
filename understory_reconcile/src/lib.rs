// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Reconcile: lane-based update scheduling and binding
//! reconciliation for retained UI trees.
//!
//! The crate keeps a retained host tree in sync with values produced by
//! render code. It has three layers:
//!
//! - **Bindings** link one dynamic value to one location in the host tree (an
//!   attribute, a property, an event, a text node or a child position).
//!   Binding a value that did not change is a no-op; everything else queues
//!   an effect that writes the host during commit.
//! - **Coroutines** are resumable units of render work. Components and roots
//!   are coroutines: the runtime resumes them while rendering, and they bind
//!   their output into slots.
//! - The **runtime** schedules updates in lanes, deduplicates redundant
//!   requests, renders until no coroutine is left and commits the queued
//!   effects in three phases (mutation, layout, passive).
//!
//! The host is abstract: a [`Backend`] provides the [`HostTree`] plus
//! scheduling primitives. [`MemoryHost`] is an in-memory tree usable for
//! tests and headless rendering.
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use understory_reconcile::{
//!     Backend, Callback, HostTree, LocalBoxFuture, MemoryHost, Part, RequestCallbackOptions,
//!     Runtime, RuntimeOptions, TemplateMode, TemplateResult, UpdateOptions, Value,
//! };
//!
//! struct Headless {
//!     host: MemoryHost,
//! }
//!
//! impl Backend for Headless {
//!     fn host(&self) -> &dyn HostTree {
//!         &self.host
//!     }
//!
//!     fn request_callback(
//!         &self,
//!         callback: Callback,
//!         _: RequestCallbackOptions,
//!     ) -> LocalBoxFuture<'static, ()> {
//!         callback()
//!     }
//!
//!     fn start_view_transition(&self, callback: Box<dyn FnOnce()>) -> LocalBoxFuture<'static, ()> {
//!         callback();
//!         Box::pin(async {})
//!     }
//!
//!     fn yield_to_main(&self) -> LocalBoxFuture<'static, ()> {
//!         Box::pin(async {})
//!     }
//! }
//!
//! let backend = Rc::new(Headless { host: MemoryHost::new() });
//! let container = backend.host.create_element("div", TemplateMode::Html);
//! let anchor = backend.host.create_comment("");
//! backend.host.append_child(container, anchor);
//!
//! let runtime = Runtime::from_rc(backend.clone(), RuntimeOptions::default());
//! let greeting = TemplateResult::html(&["Hello, ", "!"], [Value::from("world")]);
//! let root = runtime
//!     .create_root(greeting, Part::ChildNode { anchor })
//!     .with_options(UpdateOptions::default().with_flush_sync(true));
//! root.mount();
//!
//! assert_eq!(backend.host.inner_html(container), "Hello, world!");
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod backend;
mod binding;
mod component;
mod context;
mod coroutine;
mod effect;
mod error;
mod frame;
mod hooks;
mod host;
mod lane;
mod observer;
mod part;
mod root;
mod runtime;
mod slot;
mod task;
mod template;
mod value;

#[cfg(test)]
mod testing;

pub use futures_util::future::LocalBoxFuture;

pub use backend::{Backend, Callback, PrimitiveType, RequestCallbackOptions};
pub use binding::{Binding, BindingStatus, BindingType, Fragment};
pub use component::{Component, ComponentElement};
pub use context::UpdateContext;
pub use coroutine::Coroutine;
pub use effect::{CommitPhase, Effect, EffectQueue};
pub use error::{BindError, BoxError, ErrorHandle, ErrorHandler, RenderError};
pub use frame::Frame;
pub use hooks::{Cleanup, RenderContext, StateSetter, Updater};
pub use host::{HostOp, HostTree, MemoryHost, NodeId};
pub use lane::{Lanes, TaskPriority, UpdateOptions};
pub use observer::{ObserverId, RuntimeEvent, RuntimeObserver};
pub use part::{Part, PartKind};
pub use root::Root;
pub use runtime::{MAX_IDENTIFIER, Runtime, RuntimeOptions, WeakRuntime};
pub use slot::{Slot, SlotType};
pub use task::{Finished, Scheduled, TaskStatus, UpdateHandle};
pub use template::{
    Hole, HoleKind, Template, TemplateArg, TemplateAttribute, TemplateMode, TemplateNode,
    TemplateResult, TemplateSource, TemplateStrings,
};
pub use value::{Branch, ConditionalValue, Key, Listener, RepeatValue, SpreadValue, Value, ValueKind};
