// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use core::cell::Cell;
use core::error::Error;
use core::fmt;

use understory_scope::{ScopeId, ScopeTree};

use crate::binding::BindingType;
use crate::part::PartKind;
use crate::value::ValueKind;

/// Boxed error returned by component and coroutine code.
pub type BoxError = Box<dyn Error>;

/// Structural errors detected while resolving or binding values.
///
/// These are programmer errors: they surface directly to the caller of the
/// failing operation and are never retried.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    /// A template received the wrong number of values.
    #[error("template has {expected} holes but {actual} values were supplied")]
    HoleCountMismatch {
        /// Number of holes.
        expected: usize,
        /// Number of values.
        actual: usize,
    },
    /// A value was bound to a part that cannot hold it.
    #[error("cannot bind a {value} value to the {part} part")]
    PartMismatch {
        /// The offending value.
        value: ValueKind,
        /// The target part.
        part: PartKind,
    },
    /// A plain value was bound where only a directive fits.
    #[error("cannot bind a {value} value to the {part} part: a directive is required")]
    NotADirective {
        /// The offending value.
        value: ValueKind,
        /// The target part.
        part: PartKind,
    },
    /// A strict slot received a value of another binding type.
    #[error("slot holds a {expected} binding and cannot accept a {actual} value")]
    SlotTypeMismatch {
        /// The binding type the slot holds.
        expected: BindingType,
        /// The offending value.
        actual: ValueKind,
    },
    /// The backend could not parse a template.
    #[error("failed to parse template: {0}")]
    Parse(Cow<'static, str>),
}

/// A render failure that no error boundary handled.
///
/// Cloning shares the cause, so every task merged into a failed frame
/// observes the same error.
#[derive(Clone)]
pub struct RenderError {
    coroutine: Cow<'static, str>,
    trace: String,
    cause: Rc<dyn Error>,
}

impl RenderError {
    pub(crate) fn new(coroutine: Cow<'static, str>, trace: String, cause: Rc<dyn Error>) -> Self {
        Self {
            coroutine,
            trace,
            cause,
        }
    }

    /// Name of the coroutine whose resume failed.
    #[must_use]
    pub fn coroutine(&self) -> &str {
        &self.coroutine
    }

    /// The scope chain of the failing coroutine, root first.
    #[must_use]
    pub fn trace(&self) -> &str {
        &self.trace
    }

    /// The original error.
    #[must_use]
    pub fn cause(&self) -> &(dyn Error + 'static) {
        &*self.cause
    }
}

impl fmt::Debug for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderError")
            .field("coroutine", &self.coroutine)
            .field("cause", &format_args!("{}", self.cause))
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "an error occurred while rendering {}: {}\n{}",
            self.coroutine, self.cause, self.trace
        )
    }
}

impl Error for RenderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.cause)
    }
}

/// Handler registered as an error boundary.
pub type ErrorHandler = Rc<dyn Fn(&(dyn Error + 'static), &ErrorHandle)>;

/// Passed to an [`ErrorHandler`] to control propagation.
///
/// Returning from the handler without calling [`rethrow`](Self::rethrow)
/// marks the error as handled.
#[derive(Debug, Default)]
pub struct ErrorHandle {
    rethrown: Cell<bool>,
}

impl ErrorHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Passes the error on to the next boundary outward.
    pub fn rethrow(&self) {
        self.rethrown.set(true);
    }

    pub(crate) fn is_rethrown(&self) -> bool {
        self.rethrown.get()
    }
}

/// Renders the scope chain of `scope` as a tree, root first.
///
/// ```text
/// App
/// `- Panel
///    `- Button <- ERROR occurred here!
/// ```
pub(crate) fn render_trace<H>(scopes: &ScopeTree<H>, scope: ScopeId) -> String {
    let mut chain: smallvec::SmallVec<[&str; 8]> = scopes
        .ancestors(scope)
        .map(|id| scopes.name(id).unwrap_or("<anonymous>"))
        .collect();
    chain.reverse();
    let mut out = String::new();
    let last = chain.len().saturating_sub(1);
    for (depth, name) in chain.iter().enumerate() {
        if depth > 0 {
            out.push('\n');
            for _ in 1..depth {
                out.push_str("   ");
            }
            out.push_str("`- ");
        }
        out.push_str(name);
        if depth == last {
            out.push_str(" <- ERROR occurred here!");
        }
    }
    out
}
