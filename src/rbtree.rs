use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::ptr::{self, NonNull};

use alloc::boxed::Box;

use allocated::{AllocatorExt, DropIn};
use allocator_api2::alloc::Allocator;

use crate::compare::{Compare, NaturalOrder};
use crate::error::{Error, Result};

mod cursor;
mod entry;
mod header;
mod inspect;
mod iters;
mod node;
mod wrapper;

#[cfg(test)]
mod tests;

pub use cursor::{Cursor, CursorMut};
pub use entry::{Entry, OccupiedEntry, VacantEntry};
pub use inspect::{NodeView, Structure};
pub use iters::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
pub use node::Color;
pub use wrapper::RbTreeMap;

use header::{Header, Search};
use node::{LinkPtr, Node};

/// A red-black tree map using the allocated pattern.
///
/// This is the low-level type: it owns its nodes but not the allocator that
/// produced them, so every method that allocates or frees takes the allocator
/// explicitly and is `unsafe`. For most uses prefer [`RbTreeMap`], which owns
/// its allocator and offers the same operations safely.
///
/// The map owns one sentinel node, created by the constructor and freed on
/// drop. The sentinel never comes from the node allocator, so the allocator
/// sees exactly one allocation per element.
///
/// Dropping this type without calling [`DropIn::drop_in`] leaks its nodes.
///
/// # Examples
///
/// ```
/// use allocated::{CountingAllocator, DropIn};
/// use allocated_rbtree::AllocatedRbTreeMap;
///
/// let alloc = CountingAllocator::default();
/// let mut map = AllocatedRbTreeMap::<u32, String>::new();
///
/// unsafe {
///     map.insert_in(&alloc, 1, "one".to_string())?;
///     map.insert_in(&alloc, 2, "two".to_string())?;
/// }
///
/// assert_eq!(map.len(), 2);
/// assert_eq!(alloc.n_allocations(), 2);
///
/// unsafe { map.drop_in(&alloc) };
/// assert_eq!(alloc.net_allocations(), 0);
/// # Ok::<(), allocated_rbtree::Error>(())
/// ```
pub struct AllocatedRbTreeMap<K, V, C = NaturalOrder> {
    header: Header,
    cmp: C,
    len: usize,
    marker: PhantomData<Box<Node<K, V>>>,
}

// SAFETY: the map exclusively owns its nodes and sentinel; nothing is shared
// with another map.
unsafe impl<K: Send, V: Send, C: Send> Send for AllocatedRbTreeMap<K, V, C> {}
// SAFETY: shared access only ever hands out shared references to keys and
// values.
unsafe impl<K: Sync, V: Sync, C: Sync> Sync for AllocatedRbTreeMap<K, V, C> {}

impl<K, V, C: Default> AllocatedRbTreeMap<K, V, C> {
    /// Creates an empty map using the default comparator.
    ///
    /// # Panics
    ///
    /// The sentinel comes from the global heap, not from a node allocator,
    /// so running out of global memory here aborts through the global
    /// allocation error handler.
    pub fn new() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K, V, C: Default> Default for AllocatedRbTreeMap<K, V, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> AllocatedRbTreeMap<K, V, C> {
    /// Creates an empty map ordered by `cmp`.
    ///
    /// # Panics
    ///
    /// Aborts if the global heap cannot provide the sentinel; see
    /// [`new`](Self::new).
    pub fn with_comparator(cmp: C) -> Self {
        AllocatedRbTreeMap {
            header: Header::new(),
            cmp,
            len: 0,
            marker: PhantomData,
        }
    }

    /// Returns the number of elements in the map.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the map contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the comparator ordering this map.
    #[inline]
    pub fn key_comp(&self) -> &C {
        &self.cmp
    }

    /// Returns the first key-value pair in the map.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let link = self.header.first()?;
        // SAFETY: `link` is a node of this map, borrowed for `&self`.
        Some(unsafe { Node::key_value(link) })
    }

    /// Returns the last key-value pair in the map.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let link = self.header.last()?;
        // SAFETY: `link` is a node of this map, borrowed for `&self`.
        Some(unsafe { Node::key_value(link) })
    }

    /// Returns an iterator over the key-value pairs of the map, in order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.header, self.len)
    }

    /// Returns an iterator over the key-value pairs of the map, in order,
    /// with mutable references to the values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let len = self.len;
        IterMut::new(&self.header, len)
    }

    /// Returns an iterator over the keys of the map, in order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the map, in key order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns a mutable iterator over the values of the map, in key order.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Returns a cursor at the first element, or past the end if empty.
    pub fn cursor_front(&self) -> Cursor<'_, K, V, C> {
        Cursor::new(self, self.header.first())
    }

    /// Returns a cursor at the last element, or past the end if empty.
    pub fn cursor_back(&self) -> Cursor<'_, K, V, C> {
        Cursor::new(self, self.header.last())
    }

    /// Returns a cursor past the last element.
    pub fn cursor_end(&self) -> Cursor<'_, K, V, C> {
        Cursor::new(self, None)
    }

    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this map's nodes.
    pub unsafe fn cursor_front_mut_in<'a, A: Allocator>(
        &'a mut self,
        alloc: &'a A,
    ) -> CursorMut<'a, K, V, C, A> {
        let first = self.header.first();
        // SAFETY: requirements match function requirements
        unsafe { CursorMut::new(alloc, self, first) }
    }

    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this map's nodes.
    pub unsafe fn cursor_back_mut_in<'a, A: Allocator>(
        &'a mut self,
        alloc: &'a A,
    ) -> CursorMut<'a, K, V, C, A> {
        let last = self.header.last();
        // SAFETY: requirements match function requirements
        unsafe { CursorMut::new(alloc, self, last) }
    }

    /// Removes and returns the first element.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this map's nodes.
    pub unsafe fn pop_first_in<A: Allocator>(&mut self, alloc: &A) -> Option<(K, V)> {
        let link = self.header.first()?;
        // SAFETY: `link` is a node of this map; `alloc` allocated it.
        Some(unsafe { self.remove_link_in(alloc, link) })
    }

    /// Removes and returns the last element.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this map's nodes.
    pub unsafe fn pop_last_in<A: Allocator>(&mut self, alloc: &A) -> Option<(K, V)> {
        let link = self.header.last()?;
        // SAFETY: `link` is a node of this map; `alloc` allocated it.
        Some(unsafe { self.remove_link_in(alloc, link) })
    }

    /// Clears the map, destroying every node in post order.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this map's nodes.
    pub unsafe fn clear_in<A: Allocator>(&mut self, alloc: &A) {
        let n = mem::replace(&mut self.len, 0);
        // SAFETY: every node handed out is unlinked and was allocated by
        // `alloc`; it is freed exactly once. The tree is detached before the
        // first node is dropped, so a panicking drop leaks the rest.
        unsafe {
            self.header.clear(|link| drop(free_node::<K, V, A>(alloc, link)));
        }
        log::trace!("rbtree: cleared {n} nodes");
    }

    /// Unlinks `link`, rebalances, and frees its storage.
    ///
    /// # Safety
    ///
    /// `link` must be a node of this map allocated by `alloc`.
    unsafe fn remove_link_in<A: Allocator>(&mut self, alloc: &A, link: LinkPtr) -> (K, V) {
        // SAFETY: guaranteed by the caller; the node is unlinked before it
        // is freed.
        let entry = unsafe {
            self.header.extract(link);
            free_node::<K, V, A>(alloc, link)
        };
        self.len -= 1;
        entry
    }
}

impl<K, V, C: Compare<K>> AllocatedRbTreeMap<K, V, C> {
    fn search(&self, key: &K) -> Search {
        self.header.search(|link| {
            // SAFETY: the header only probes nodes of this map.
            let (node_key, _) = unsafe { Node::<K, V>::key_value(link) };
            self.cmp.order(key, node_key)
        })
    }

    fn lookup(&self, key: &K) -> Option<LinkPtr> {
        match self.search(key) {
            Search::Found(link) => Some(link),
            Search::Vacant { .. } => None,
        }
    }

    /// Returns `true` if the map contains an element equivalent to `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.lookup(key).is_some()
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key-value pair equivalent to `key`.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let link = self.lookup(key)?;
        // SAFETY: `link` is a node of this map, borrowed for `&self`.
        Some(unsafe { Node::key_value(link) })
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let link = self.lookup(key)?;
        // SAFETY: `link` is a node of this map, exclusively borrowed for
        // `&mut self`.
        Some(unsafe { Node::<K, V>::key_value_mut(link) }.1)
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if no element matches.
    pub fn at(&self, key: &K) -> Result<&V> {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if no element matches.
    pub fn at_mut(&mut self, key: &K) -> Result<&mut V> {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a cursor at the element equivalent to `key`, or past the end.
    pub fn find(&self, key: &K) -> Cursor<'_, K, V, C> {
        Cursor::new(self, self.lookup(key))
    }

    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this map's nodes.
    pub unsafe fn find_mut_in<'a, A: Allocator>(
        &'a mut self,
        alloc: &'a A,
        key: &K,
    ) -> CursorMut<'a, K, V, C, A> {
        let found = self.lookup(key);
        // SAFETY: requirements match function requirements
        unsafe { CursorMut::new(alloc, self, found) }
    }

    /// Gets the given key's entry in the map for in-place manipulation.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this map's nodes.
    pub unsafe fn entry_in<'a, A: Allocator>(
        &'a mut self,
        alloc: &'a A,
        key: K,
    ) -> Entry<'a, K, V, C, A> {
        match self.search(&key) {
            Search::Found(link) => {
                // SAFETY: requirements match function requirements
                Entry::Occupied(unsafe { OccupiedEntry::new(alloc, self, link) })
            }
            Search::Vacant { parent, left } => {
                // SAFETY: requirements match function requirements; the
                // search result is fresh.
                Entry::Vacant(unsafe { VacantEntry::new(alloc, self, key, parent, left) })
            }
        }
    }

    /// Inserts a key-value pair unless an equivalent key is present.
    ///
    /// Returns a cursor at the element with that key and `true` if the pair
    /// was inserted. An existing element is never overwritten; the rejected
    /// pair is dropped.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this map's nodes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`] if the node allocation fails. The
    /// map is unchanged in that case.
    pub unsafe fn insert_in<'a, A: Allocator>(
        &'a mut self,
        alloc: &'a A,
        key: K,
        value: V,
    ) -> Result<(CursorMut<'a, K, V, C, A>, bool)> {
        // SAFETY: requirements match function requirements
        match unsafe { self.entry_in(alloc, key) } {
            Entry::Occupied(entry) => Ok((entry.into_cursor(), false)),
            Entry::Vacant(entry) => Ok((entry.insert_cursor(value)?, true)),
        }
    }

    /// Removes the element equivalent to `key`, returning it. Removing an
    /// absent key does nothing.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this map's nodes.
    pub unsafe fn remove_entry_in<A: Allocator>(&mut self, alloc: &A, key: &K) -> Option<(K, V)> {
        let link = self.lookup(key)?;
        // SAFETY: `link` is a node of this map; `alloc` allocated it.
        Some(unsafe { self.remove_link_in(alloc, link) })
    }

    /// Inserts every pair of `iter`, skipping keys already present.
    ///
    /// # Safety
    ///
    /// `alloc` MUST be the allocator used to allocate this map's nodes.
    ///
    /// # Errors
    ///
    /// Stops at the first failed node allocation. Pairs inserted before the
    /// failure stay in the map.
    pub unsafe fn try_extend_in<A: Allocator, I>(&mut self, alloc: &A, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in iter {
            // SAFETY: requirements match function requirements
            unsafe { self.insert_in(alloc, k, v)? };
        }
        Ok(())
    }
}

impl<K, V, C> DropIn for AllocatedRbTreeMap<K, V, C> {
    /// # Safety
    ///
    /// `alloc` must be the allocator used to allocate this map's nodes.
    unsafe fn drop_in<A: Allocator>(&mut self, alloc: &A) {
        // SAFETY: requirements match function requirements
        unsafe { self.clear_in(alloc) }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for AllocatedRbTreeMap<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'s, K, V, C> IntoIterator for &'s AllocatedRbTreeMap<K, V, C> {
    type IntoIter = Iter<'s, K, V>;
    type Item = (&'s K, &'s V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'s, K, V, C> IntoIterator for &'s mut AllocatedRbTreeMap<K, V, C> {
    type IntoIter = IterMut<'s, K, V>;
    type Item = (&'s K, &'s mut V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Allocates a node from `alloc` and moves `node` into it.
///
/// Nothing is linked yet, so a failure leaves every tree untouched.
fn allocate_node<K, V, A: Allocator>(alloc: &A, node: Node<K, V>) -> Result<NonNull<Node<K, V>>> {
    match alloc.allocate_from(node) {
        Ok(guard) => Ok(guard.into_inner()),
        Err(err) => {
            log::warn!(
                "rbtree: allocator refused a {}-byte node",
                mem::size_of::<Node<K, V>>()
            );
            Err(err.into())
        }
    }
}

/// Moves the key and value out of an unlinked node and returns its storage
/// to `alloc`.
///
/// # Safety
///
/// `link` must be a `Node<K, V>` allocated by `alloc`, no longer reachable
/// from any tree, and not freed before.
unsafe fn free_node<K, V, A: Allocator>(alloc: &A, link: LinkPtr) -> (K, V) {
    // SAFETY: guaranteed by the caller.
    let node = unsafe { Node::<K, V>::from_link(link) };
    // SAFETY: the node is initialised and read exactly once.
    let owned = unsafe { ptr::read(node.as_ptr()) };
    // SAFETY: `node` was allocated by `alloc` as a `Node<K, V>`.
    unsafe { alloc.deallocate_from(node) };
    (owned.key, owned.value)
}
