// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Roots: the entry point that binds a value to a container.

use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

use understory_scope::ScopeId;

use crate::context::UpdateContext;
use crate::coroutine::Coroutine;
use crate::error::BoxError;
use crate::lane::{Lanes, UpdateOptions};
use crate::part::Part;
use crate::runtime::Runtime;
use crate::slot::Slot;
use crate::task::UpdateHandle;
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RootCommand {
    Mount,
    Update,
    Unmount,
}

struct RootState {
    value: Value,
    command: Option<RootCommand>,
    slot: Option<Slot>,
}

struct RootCoroutine {
    part: Part,
    scope: ScopeId,
    pending_lanes: Cell<Lanes>,
    state: RefCell<RootState>,
}

impl Coroutine for RootCoroutine {
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
        let mut state = self.state.borrow_mut();
        let RootState {
            value,
            command,
            slot,
        } = &mut *state;
        match command.take() {
            None => {}
            Some(RootCommand::Mount | RootCommand::Update) => match slot {
                Some(slot) => slot.reconcile(value.clone(), ctx)?,
                None => {
                    let created = ctx.resolve_slot(value.clone(), self.part.clone())?;
                    created.connect(ctx)?;
                    *slot = Some(created);
                }
            },
            Some(RootCommand::Unmount) => {
                if let Some(old) = slot.take() {
                    old.unbind(ctx);
                    old.disconnect(ctx);
                }
            }
        }
        Ok(())
    }
}

/// Binds a value to a container part and keeps it up to date.
///
/// Every method schedules an update and returns its handle; nothing touches
/// the host until the runtime runs the frame.
pub struct Root {
    runtime: Runtime,
    coroutine: Rc<RootCoroutine>,
    options: UpdateOptions,
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("part", &self.coroutine.part)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Root {
    pub(crate) fn new(runtime: Runtime, value: Value, part: Part) -> Self {
        let scope = runtime.create_scope(None, "Root");
        Self {
            runtime,
            coroutine: Rc::new(RootCoroutine {
                part,
                scope,
                pending_lanes: Cell::new(Lanes::empty()),
                state: RefCell::new(RootState {
                    value,
                    command: None,
                    slot: None,
                }),
            }),
            options: UpdateOptions::default(),
        }
    }

    /// Uses `options` for every update this root schedules.
    #[must_use]
    pub fn with_options(mut self, options: UpdateOptions) -> Self {
        self.options = options;
        self
    }

    /// The container part.
    #[must_use]
    pub fn part(&self) -> &Part {
        &self.coroutine.part
    }

    /// The scope the rendered tree lives under.
    #[must_use]
    pub fn scope(&self) -> ScopeId {
        self.coroutine.scope
    }

    /// Renders the root value.
    pub fn mount(&self) -> UpdateHandle {
        self.command(RootCommand::Mount, None)
    }

    /// Replaces the root value.
    pub fn update(&self, value: impl Into<Value>) -> UpdateHandle {
        self.command(RootCommand::Update, Some(value.into()))
    }

    /// Removes everything the root rendered.
    pub fn unmount(&self) -> UpdateHandle {
        self.command(RootCommand::Unmount, None)
    }

    fn command(&self, command: RootCommand, value: Option<Value>) -> UpdateHandle {
        {
            let mut state = self.coroutine.state.borrow_mut();
            if let Some(value) = value {
                state.value = value;
            }
            state.command = Some(command);
        }
        self.runtime
            .schedule_update(self.coroutine.clone(), self.options)
    }
}
