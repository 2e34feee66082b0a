use core::fmt;
use core::mem;

use allocator_api2::alloc::Allocator;

use super::cursor::CursorMut;
use super::node::{LinkPtr, Node};
use super::{allocate_node, AllocatedRbTreeMap};
use crate::error::Result;

/// A view into a single key of a map, which is either vacant or occupied.
///
/// Created by [`entry_in`](AllocatedRbTreeMap::entry_in) and
/// [`RbTreeMap::entry`](super::RbTreeMap::entry).
pub enum Entry<'a, K, V, C, A: Allocator> {
    Vacant(VacantEntry<'a, K, V, C, A>),
    Occupied(OccupiedEntry<'a, K, V, C, A>),
}

impl<'a, K, V, C, A: Allocator> Entry<'a, K, V, C, A> {
    /// Returns the key of this entry: the probe for a vacant entry, the
    /// stored key for an occupied one.
    pub fn key(&self) -> &K {
        match self {
            Entry::Vacant(entry) => entry.key(),
            Entry::Occupied(entry) => entry.key(),
        }
    }

    /// Inserts `default` if the entry is vacant and returns the value.
    ///
    /// # Errors
    ///
    /// Returns an error if a node allocation fails.
    pub fn or_insert(self, default: V) -> Result<&'a mut V> {
        match self {
            Entry::Vacant(entry) => entry.insert(default),
            Entry::Occupied(entry) => Ok(entry.into_mut()),
        }
    }

    /// Inserts the result of `default` if the entry is vacant. `default` is
    /// not called for an occupied entry.
    ///
    /// # Errors
    ///
    /// Returns an error if a node allocation fails.
    pub fn or_insert_with<F: FnOnce() -> V>(self, default: F) -> Result<&'a mut V> {
        match self {
            Entry::Vacant(entry) => entry.insert(default()),
            Entry::Occupied(entry) => Ok(entry.into_mut()),
        }
    }

    /// Inserts `V::default()` if the entry is vacant.
    ///
    /// # Errors
    ///
    /// Returns an error if a node allocation fails.
    pub fn or_default(self) -> Result<&'a mut V>
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    /// Runs `f` on the value of an occupied entry.
    #[must_use]
    pub fn and_modify<F: FnOnce(&mut V)>(self, f: F) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            vacant @ Entry::Vacant(_) => vacant,
        }
    }
}

impl<'a, K: fmt::Debug, V: fmt::Debug, C, A: Allocator> fmt::Debug for Entry<'a, K, V, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Vacant(entry) => f.debug_tuple("Entry").field(entry).finish(),
            Entry::Occupied(entry) => f.debug_tuple("Entry").field(entry).finish(),
        }
    }
}

/// A vacant entry: the key is absent and the position where it belongs is
/// already known.
pub struct VacantEntry<'a, K, V, C, A: Allocator> {
    alloc: &'a A,
    tree: &'a mut AllocatedRbTreeMap<K, V, C>,
    key: K,
    parent: LinkPtr,
    left: bool,
}

impl<'a, K, V, C, A: Allocator> VacantEntry<'a, K, V, C, A> {
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate `tree`'s nodes, and
    /// `parent`/`left` must come from a search for `key` on `tree` with no
    /// modification since.
    pub(super) unsafe fn new(
        alloc: &'a A,
        tree: &'a mut AllocatedRbTreeMap<K, V, C>,
        key: K,
        parent: LinkPtr,
        left: bool,
    ) -> Self {
        VacantEntry {
            alloc,
            tree,
            key,
            parent,
            left,
        }
    }

    /// Returns the key that would be inserted.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes the key back without inserting anything.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the key with `value` and returns a reference to the value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`](crate::Error::ResourceExhausted)
    /// if the node cannot be allocated. The map is unchanged and the key and
    /// value are dropped.
    pub fn insert(self, value: V) -> Result<&'a mut V> {
        let (_, _, link) = self.attach(value)?;
        // SAFETY: the entry held the map's exclusive borrow for `'a`, and
        // `link` is now one of its nodes.
        Ok(unsafe { Node::<K, V>::key_value_mut(link) }.1)
    }

    /// Inserts the key with `value` and returns a cursor at the new element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`](crate::Error::ResourceExhausted)
    /// if the node cannot be allocated. The map is unchanged.
    pub fn insert_cursor(self, value: V) -> Result<CursorMut<'a, K, V, C, A>> {
        let (alloc, tree, link) = self.attach(value)?;
        // SAFETY: `alloc` allocated `link`, which now belongs to `tree`.
        Ok(unsafe { CursorMut::new(alloc, tree, Some(link)) })
    }

    /// Allocates the node and links it at the recorded position.
    #[allow(clippy::type_complexity)]
    fn attach(self, value: V) -> Result<(&'a A, &'a mut AllocatedRbTreeMap<K, V, C>, LinkPtr)> {
        let VacantEntry {
            alloc,
            tree,
            key,
            parent,
            left,
        } = self;
        let node = allocate_node(alloc, Node::new(key, value, tree.header.nil))?;
        let link = Node::link(node);
        // SAFETY: `link` is a fresh red node and `parent`/`left` locate an
        // empty child slot of the unmodified tree.
        unsafe { tree.header.insert(link, parent, left) };
        tree.len += 1;
        Ok((alloc, tree, link))
    }
}

impl<'a, K: fmt::Debug, V, C, A: Allocator> fmt::Debug for VacantEntry<'a, K, V, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VacantEntry").field(self.key()).finish()
    }
}

/// An occupied entry: an element with an equivalent key is present.
pub struct OccupiedEntry<'a, K, V, C, A: Allocator> {
    alloc: &'a A,
    tree: &'a mut AllocatedRbTreeMap<K, V, C>,
    link: LinkPtr,
}

impl<'a, K, V, C, A: Allocator> OccupiedEntry<'a, K, V, C, A> {
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate `tree`'s nodes, and
    /// `link` a node of `tree`.
    pub(super) unsafe fn new(
        alloc: &'a A,
        tree: &'a mut AllocatedRbTreeMap<K, V, C>,
        link: LinkPtr,
    ) -> Self {
        OccupiedEntry { alloc, tree, link }
    }

    /// Returns the stored key.
    pub fn key(&self) -> &K {
        // SAFETY: `link` is a live node borrowed for `&self`.
        unsafe { Node::<K, V>::key_value(self.link) }.0
    }

    /// Returns the stored value.
    pub fn get(&self) -> &V {
        // SAFETY: `link` is a live node borrowed for `&self`.
        unsafe { Node::<K, V>::key_value(self.link) }.1
    }

    /// Returns the stored value mutably, for as long as the entry lives.
    pub fn get_mut(&mut self) -> &mut V {
        // SAFETY: `link` is a live node exclusively borrowed for `&mut self`.
        unsafe { Node::<K, V>::key_value_mut(self.link) }.1
    }

    /// Converts the entry into a mutable reference that outlives it.
    pub fn into_mut(self) -> &'a mut V {
        // SAFETY: the entry held the map's exclusive borrow for `'a`.
        unsafe { Node::<K, V>::key_value_mut(self.link) }.1
    }

    /// Replaces the value, returning the old one. The key is kept.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }

    /// Removes the element and returns it.
    pub fn remove_entry(self) -> (K, V) {
        // SAFETY: `link` is a node of `tree` allocated by `alloc`.
        unsafe { self.tree.remove_link_in(self.alloc, self.link) }
    }

    /// Removes the element and returns its value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Converts the entry into a cursor at its element.
    pub fn into_cursor(self) -> CursorMut<'a, K, V, C, A> {
        // SAFETY: requirements were established by `new`.
        unsafe { CursorMut::new(self.alloc, self.tree, Some(self.link)) }
    }
}

impl<'a, K: fmt::Debug, V: fmt::Debug, C, A: Allocator> fmt::Debug for OccupiedEntry<'a, K, V, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OccupiedEntry")
            .field("key", self.key())
            .field("value", self.get())
            .finish()
    }
}
