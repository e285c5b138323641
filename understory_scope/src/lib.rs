// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Scope: parent-linked scopes for context lookup and error boundaries.
//!
//! A UI runtime needs two kinds of "look upward" queries while rendering:
//!
//! - **Context lookup**: a component asks for the nearest value of some type
//!   provided by one of its ancestors (dependency injection).
//! - **Error boundaries**: when rendering fails, the runtime asks for the
//!   nearest ancestor that registered an error handler.
//!
//! Both are answered by walking a chain of [`ScopeId`]s from a scope to the root.
//! This crate stores those scopes in a [`ScopeTree`], an arena of nodes with
//! parent back-references. There are no owning pointers between scopes, so
//! chains can be shared and walked cheaply without reference cycles.
//!
//! ## Semantics
//!
//! - Creating a scope never mutates its ancestors.
//! - Context writes are local to the scope they are written to; descendants
//!   observe them through the chain, siblings and ancestors never do.
//! - Removing a scope frees its slot. A [`ScopeId`] pointing to a removed
//!   scope is stale and never aliases a newer scope. A live child whose parent
//!   was removed behaves as a root.
//!
//! ## Example
//!
//! ```rust
//! use understory_scope::ScopeTree;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Theme(&'static str);
//!
//! let mut tree = ScopeTree::<()>::new();
//! let app = tree.insert(None, "App");
//! let panel = tree.insert(Some(app), "Panel");
//! let button = tree.insert(Some(panel), "Button");
//!
//! tree.set_context(app, Theme("light"));
//! tree.set_context(panel, Theme("dark"));
//!
//! assert_eq!(tree.context::<Theme>(button), Some(&Theme("dark")));
//! assert_eq!(tree.context::<Theme>(app), Some(&Theme("light")));
//!
//! let names: Vec<_> = tree.ancestors(button).filter_map(|id| tree.name(id)).collect();
//! assert_eq!(names, ["Button", "Panel", "App"]);
//! ```
//!
//! ## Error boundaries
//!
//! [`ScopeTree`] is generic over the handler type `H` stored at each boundary.
//! The tree only records and finds handlers; invoking them is up to the
//! caller.
//!
//! ```rust
//! use understory_scope::ScopeTree;
//!
//! let mut tree = ScopeTree::<&'static str>::new();
//! let root = tree.insert(None, "Root");
//! let child = tree.insert(Some(root), "Child");
//! tree.set_boundary(root, "root handler");
//!
//! let nearest = tree.boundaries(child).next().map(|(_, h)| *h);
//! assert_eq!(nearest, Some("root handler"));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod id;
mod tree;

pub use id::ScopeId;
pub use tree::{Ancestors, Boundaries, ScopeTree};
