//! Bidirectional cursors over the in-order sequence.
//!
//! A cursor is either positioned at an element or past the end. It keeps a
//! reference to its map so that stepping back from past-the-end can find the
//! last element.

use core::fmt;

use allocator_api2::alloc::Allocator;

use super::node::{LinkPtr, Node};
use super::AllocatedRbTreeMap;

/// A read-only cursor into a map.
///
/// Two cursors are equal when they belong to the same map and are at the
/// same element, or are both past the end.
pub struct Cursor<'a, K, V, C> {
    tree: &'a AllocatedRbTreeMap<K, V, C>,
    current: Option<LinkPtr>,
}

impl<'a, K, V, C> Clone for Cursor<'a, K, V, C> {
    fn clone(&self) -> Self {
        Cursor {
            tree: self.tree,
            current: self.current,
        }
    }
}

impl<'a, K, V, C> Cursor<'a, K, V, C> {
    pub(super) fn new(tree: &'a AllocatedRbTreeMap<K, V, C>, current: Option<LinkPtr>) -> Self {
        Cursor { tree, current }
    }

    /// Returns `true` if the cursor is past the end.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Returns the element under the cursor.
    pub fn key_value(&self) -> Option<(&'a K, &'a V)> {
        // SAFETY: the cursor borrows the map, so the node is live and no
        // mutable reference to it exists.
        self.current.map(|link| unsafe { Node::key_value(link) })
    }

    /// Returns the key at the cursor, or `None` past the end.
    pub fn key(&self) -> Option<&'a K> {
        self.key_value().map(|(k, _)| k)
    }

    /// Returns the value at the cursor, or `None` past the end.
    pub fn value(&self) -> Option<&'a V> {
        self.key_value().map(|(_, v)| v)
    }

    /// Moves to the next element. Past the last element the cursor is at
    /// the end; from the end it wraps to the first element.
    pub fn move_next(&mut self) {
        let header = &self.tree.header;
        self.current = match self.current {
            Some(link) => header.successor(link),
            None => header.first(),
        };
    }

    /// Moves to the previous element. Before the first element the cursor
    /// is at the end; from the end it moves to the last element.
    pub fn move_prev(&mut self) {
        let header = &self.tree.header;
        self.current = match self.current {
            Some(link) => header.predecessor(link),
            None => header.last(),
        };
    }

    /// Returns a cursor one step ahead of this one.
    pub fn peek_next(&self) -> Cursor<'a, K, V, C> {
        let mut next = self.clone();
        next.move_next();
        next
    }

    /// Returns a cursor one step behind this one.
    pub fn peek_prev(&self) -> Cursor<'a, K, V, C> {
        let mut prev = self.clone();
        prev.move_prev();
        prev
    }
}

impl<'a, K, V, C> PartialEq for Cursor<'a, K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.tree, other.tree) && self.current == other.current
    }
}

impl<'a, K, V, C> Eq for Cursor<'a, K, V, C> {}

impl<'a, K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for Cursor<'a, K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.key_value()).finish()
    }
}

/// A cursor that can modify values and remove elements.
pub struct CursorMut<'a, K, V, C, A: Allocator> {
    alloc: &'a A,
    tree: &'a mut AllocatedRbTreeMap<K, V, C>,
    current: Option<LinkPtr>,
}

impl<'a, K, V, C, A: Allocator> CursorMut<'a, K, V, C, A> {
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate `tree`'s nodes, and
    /// `current` a node of `tree`.
    pub(super) unsafe fn new(
        alloc: &'a A,
        tree: &'a mut AllocatedRbTreeMap<K, V, C>,
        current: Option<LinkPtr>,
    ) -> Self {
        CursorMut {
            alloc,
            tree,
            current,
        }
    }

    /// Returns `true` if the cursor is past the end.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Returns the element under the cursor.
    pub fn key_value(&self) -> Option<(&K, &V)> {
        // SAFETY: the node is live and borrowed for `&self`.
        self.current.map(|link| unsafe { Node::key_value(link) })
    }

    /// Returns the key at the cursor, or `None` past the end.
    pub fn key(&self) -> Option<&K> {
        self.key_value().map(|(k, _)| k)
    }

    /// Returns the element under the cursor with a mutable value. The key
    /// cannot be changed in place.
    pub fn key_value_mut(&mut self) -> Option<(&K, &mut V)> {
        // SAFETY: the node is live and exclusively borrowed for `&mut self`.
        self.current.map(|link| unsafe { Node::key_value_mut(link) })
    }

    /// Returns the value at the cursor mutably.
    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.key_value_mut().map(|(_, v)| v)
    }

    /// Converts the cursor into a mutable reference to the current value
    /// that lives as long as the map borrow the cursor was made from.
    pub fn into_value_mut(self) -> Option<&'a mut V> {
        // SAFETY: the cursor held the map's exclusive borrow for `'a` and is
        // consumed here.
        self.current
            .map(|link| unsafe { Node::<K, V>::key_value_mut(link) }.1)
    }

    /// Moves to the next element, wrapping from the end to the first.
    pub fn move_next(&mut self) {
        let header = &self.tree.header;
        self.current = match self.current {
            Some(link) => header.successor(link),
            None => header.first(),
        };
    }

    /// Moves to the previous element, wrapping from the end to the last.
    pub fn move_prev(&mut self) {
        let header = &self.tree.header;
        self.current = match self.current {
            Some(link) => header.predecessor(link),
            None => header.last(),
        };
    }

    /// Returns a read-only cursor at the same position.
    pub fn as_cursor(&self) -> Cursor<'_, K, V, C> {
        Cursor::new(self.tree, self.current)
    }

    pub fn peek_next(&self) -> Cursor<'_, K, V, C> {
        self.as_cursor().peek_next()
    }

    pub fn peek_prev(&self) -> Cursor<'_, K, V, C> {
        self.as_cursor().peek_prev()
    }

    /// Removes the current element and moves to its successor.
    ///
    /// Returns `None` and does nothing if the cursor is past the end. Other
    /// cursors cannot observe the removal: the borrow checker keeps them
    /// from coexisting with this one.
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        let link = self.current?;
        self.current = self.tree.header.successor(link);
        // SAFETY: `link` is a node of the tree and `alloc` allocated it, as
        // promised when the cursor was created.
        Some(unsafe { self.tree.remove_link_in(self.alloc, link) })
    }
}

impl<'a, K: fmt::Debug, V: fmt::Debug, C, A: Allocator> fmt::Debug for CursorMut<'a, K, V, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.key_value()).finish()
    }
}
