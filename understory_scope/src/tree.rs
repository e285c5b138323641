// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scope arena.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;

use smallvec::SmallVec;

use crate::id::ScopeId;

/// Most scopes provide zero or one context value.
const INLINE_CONTEXTS: usize = 2;

struct ScopeNode<H> {
    parent: Option<ScopeId>,
    name: Cow<'static, str>,
    /// Context values keyed by their type, in insertion order.
    contexts: SmallVec<[(TypeId, Box<dyn Any>); INLINE_CONTEXTS]>,
    boundary: Option<H>,
}

struct Slot<H> {
    generation: u32,
    node: Option<ScopeNode<H>>,
}

/// Arena of parent-linked scopes.
///
/// See the [crate documentation](crate) for the lookup semantics.
///
/// # Type Parameters
///
/// - `H`: The error-boundary handler type stored by [`set_boundary`](Self::set_boundary).
pub struct ScopeTree<H> {
    slots: Vec<Slot<H>>,
    free: Vec<u32>,
    len: usize,
}

impl<H> Default for ScopeTree<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for ScopeTree<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeTree")
            .field("len", &self.len)
            .field("capacity", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl<H> ScopeTree<H> {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Returns the number of live scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there are no live scopes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Creates a new scope under `parent` (or a root scope if `None`).
    ///
    /// A stale `parent` is treated like `None`.
    pub fn insert(&mut self, parent: Option<ScopeId>, name: impl Into<Cow<'static, str>>) -> ScopeId {
        let parent = parent.filter(|p| self.is_alive(*p));
        let node = ScopeNode {
            parent,
            name: name.into(),
            contexts: SmallVec::new(),
            boundary: None,
        };
        self.len += 1;
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(node);
            ScopeId::new(idx, slot.generation)
        } else {
            let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 1,
                node: Some(node),
            });
            ScopeId::new(idx, 1)
        }
    }

    /// Removes a scope, dropping its context values and boundary.
    ///
    /// Returns `false` if `id` was already stale. Descendants are left alone;
    /// their parent link becomes stale and they behave as roots.
    pub fn remove(&mut self, id: ScopeId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        self.slots[id.idx()].node = None;
        self.free.push(id.0);
        self.len -= 1;
        true
    }

    /// Returns `true` if `id` refers to a live scope.
    #[must_use]
    pub fn is_alive(&self, id: ScopeId) -> bool {
        self.slots
            .get(id.idx())
            .is_some_and(|slot| slot.generation == id.1 && slot.node.is_some())
    }

    fn node(&self, id: ScopeId) -> Option<&ScopeNode<H>> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: ScopeId) -> Option<&mut ScopeNode<H>> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.node.as_mut()
    }

    /// Returns the live parent of `id`, if any.
    #[must_use]
    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.node(id)?.parent.filter(|p| self.is_alive(*p))
    }

    /// Returns the name given to `id` at insertion.
    #[must_use]
    pub fn name(&self, id: ScopeId) -> Option<&str> {
        self.node(id).map(|n| n.name.as_ref())
    }

    /// Iterates `id` and then each live ancestor, nearest first.
    ///
    /// Yields nothing if `id` is stale.
    #[must_use]
    pub fn ancestors(&self, id: ScopeId) -> Ancestors<'_, H> {
        Ancestors {
            tree: self,
            next: self.is_alive(id).then_some(id),
        }
    }

    /// Returns the number of live ancestors of `id`.
    #[must_use]
    pub fn depth(&self, id: ScopeId) -> usize {
        self.ancestors(id).count().saturating_sub(1)
    }

    // -------------------------------------------------------------------------
    // Context values
    // -------------------------------------------------------------------------

    /// Stores a context value of type `T` on `id`, replacing any previous
    /// value of the same type on that scope.
    ///
    /// Returns `false` if `id` is stale.
    pub fn set_context<T: 'static>(&mut self, id: ScopeId, value: T) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        let key = TypeId::of::<T>();
        if let Some(entry) = node.contexts.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = Box::new(value);
        } else {
            node.contexts.push((key, Box::new(value)));
        }
        true
    }

    /// Removes the context value of type `T` stored directly on `id`.
    pub fn remove_context<T: 'static>(&mut self, id: ScopeId) -> Option<T> {
        let node = self.node_mut(id)?;
        let key = TypeId::of::<T>();
        let pos = node.contexts.iter().position(|(k, _)| *k == key)?;
        let (_, value) = node.contexts.remove(pos);
        value.downcast::<T>().ok().map(|b| *b)
    }

    /// Returns the value of type `T` stored directly on `id`.
    #[must_use]
    pub fn local_context<T: 'static>(&self, id: ScopeId) -> Option<&T> {
        let key = TypeId::of::<T>();
        self.node(id)?
            .contexts
            .iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| v.downcast_ref::<T>())
    }

    /// Returns the nearest value of type `T` on `id` or one of its ancestors.
    #[must_use]
    pub fn context<T: 'static>(&self, id: ScopeId) -> Option<&T> {
        self.ancestors(id)
            .find_map(|scope| self.local_context::<T>(scope))
    }

    // -------------------------------------------------------------------------
    // Error boundaries
    // -------------------------------------------------------------------------

    /// Registers `handler` as the error boundary of `id`, returning the
    /// previous handler.
    pub fn set_boundary(&mut self, id: ScopeId, handler: H) -> Option<H> {
        self.node_mut(id)?.boundary.replace(handler)
    }

    /// Removes the error boundary of `id`.
    pub fn clear_boundary(&mut self, id: ScopeId) -> Option<H> {
        self.node_mut(id)?.boundary.take()
    }

    /// Returns the boundary registered directly on `id`.
    #[must_use]
    pub fn boundary(&self, id: ScopeId) -> Option<&H> {
        self.node(id)?.boundary.as_ref()
    }

    /// Iterates the boundaries on `id` and its ancestors, nearest first.
    #[must_use]
    pub fn boundaries(&self, id: ScopeId) -> Boundaries<'_, H> {
        Boundaries {
            ancestors: self.ancestors(id),
        }
    }
}

/// Iterator over a scope and its ancestors, returned by [`ScopeTree::ancestors`].
pub struct Ancestors<'a, H> {
    tree: &'a ScopeTree<H>,
    next: Option<ScopeId>,
}

impl<H> fmt::Debug for Ancestors<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ancestors").field("next", &self.next).finish()
    }
}

impl<H> Iterator for Ancestors<'_, H> {
    type Item = ScopeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Iterator over registered boundaries, returned by [`ScopeTree::boundaries`].
pub struct Boundaries<'a, H> {
    ancestors: Ancestors<'a, H>,
}

impl<H> fmt::Debug for Boundaries<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Boundaries")
            .field("next", &self.ancestors.next)
            .finish()
    }
}

impl<'a, H> Iterator for Boundaries<'a, H> {
    type Item = (ScopeId, &'a H);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.ancestors.tree;
        self.ancestors
            .by_ref()
            .find_map(|id| tree.boundary(id).map(|h| (id, h)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[derive(Clone, Debug, PartialEq)]
    struct Locale(&'static str);

    #[test]
    fn insert_assigns_fresh_ids() {
        let mut tree = ScopeTree::<()>::new();
        let a = tree.insert(None, "a");
        let b = tree.insert(Some(a), "b");
        assert_ne!(a, b);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.parent(b), Some(a));
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.depth(b), 1);
    }

    #[test]
    fn removed_ids_are_stale_after_reuse() {
        let mut tree = ScopeTree::<()>::new();
        let a = tree.insert(None, "a");
        assert!(tree.remove(a));
        assert!(!tree.remove(a));
        let b = tree.insert(None, "b");
        assert_eq!(a.0, b.0, "slot should be reused");
        assert_ne!(a, b);
        assert!(!tree.is_alive(a));
        assert!(tree.is_alive(b));
        assert_eq!(tree.name(a), None);
        assert_eq!(tree.name(b), Some("b"));
    }

    #[test]
    fn context_lookup_walks_to_nearest_provider() {
        let mut tree = ScopeTree::<()>::new();
        let root = tree.insert(None, "root");
        let mid = tree.insert(Some(root), "mid");
        let leaf = tree.insert(Some(mid), "leaf");

        assert_eq!(tree.context::<Locale>(leaf), None);
        tree.set_context(root, Locale("en"));
        assert_eq!(tree.context::<Locale>(leaf), Some(&Locale("en")));
        tree.set_context(mid, Locale("fr"));
        assert_eq!(tree.context::<Locale>(leaf), Some(&Locale("fr")));
        assert_eq!(tree.local_context::<Locale>(leaf), None);
    }

    #[test]
    fn context_writes_do_not_leak_to_siblings_or_ancestors() {
        let mut tree = ScopeTree::<()>::new();
        let root = tree.insert(None, "root");
        let left = tree.insert(Some(root), "left");
        let right = tree.insert(Some(root), "right");

        tree.set_context(left, Locale("de"));
        assert_eq!(tree.context::<Locale>(left), Some(&Locale("de")));
        assert_eq!(tree.context::<Locale>(right), None);
        assert_eq!(tree.context::<Locale>(root), None);
    }

    #[test]
    fn set_context_replaces_same_type_only() {
        let mut tree = ScopeTree::<()>::new();
        let root = tree.insert(None, "root");
        tree.set_context(root, Locale("en"));
        tree.set_context(root, 7_u32);
        tree.set_context(root, Locale("ja"));
        assert_eq!(tree.context::<Locale>(root), Some(&Locale("ja")));
        assert_eq!(tree.context::<u32>(root), Some(&7));
        assert_eq!(tree.remove_context::<u32>(root), Some(7));
        assert_eq!(tree.context::<u32>(root), None);
    }

    #[test]
    fn orphaned_child_behaves_as_root() {
        let mut tree = ScopeTree::<()>::new();
        let root = tree.insert(None, "root");
        let child = tree.insert(Some(root), "child");
        tree.set_context(root, Locale("en"));
        tree.remove(root);
        assert_eq!(tree.parent(child), None);
        assert_eq!(tree.context::<Locale>(child), None);
        let names: vec::Vec<_> = tree.ancestors(child).collect();
        assert_eq!(names, vec![child]);
    }

    #[test]
    fn boundaries_are_found_nearest_first() {
        let mut tree = ScopeTree::<u32>::new();
        let root = tree.insert(None, "root");
        let mid = tree.insert(Some(root), "mid");
        let leaf = tree.insert(Some(mid), "leaf");
        tree.set_boundary(root, 1);
        tree.set_boundary(mid, 2);

        let found: vec::Vec<_> = tree.boundaries(leaf).map(|(id, h)| (id, *h)).collect();
        assert_eq!(found, vec![(mid, 2), (root, 1)]);

        assert_eq!(tree.clear_boundary(mid), Some(2));
        let nearest = tree.boundaries(leaf).next().map(|(id, _)| id);
        assert_eq!(nearest, Some(root));
    }

    #[test]
    fn stale_ids_are_rejected_by_writes() {
        let mut tree = ScopeTree::<u32>::new();
        let a = tree.insert(None, "a");
        tree.remove(a);
        assert!(!tree.set_context(a, Locale("en")));
        assert_eq!(tree.set_boundary(a, 3), None);
        assert_eq!(tree.ancestors(a).count(), 0);
    }
}
