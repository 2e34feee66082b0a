//! Ergonomic wrapper for the red-black tree map.
//!
//! This module provides [`RbTreeMap<K, V, C, A>`], a wrapper around
//! [`AllocatedRbTreeMap`] that owns an allocator, making it safe and
//! ergonomic to use.

use core::fmt;
use core::mem;
use core::ops::Index;

use allocator_api2::alloc::{Allocator, Global};

use allocated::DropIn;

use super::node::Node;
use super::{
    AllocatedRbTreeMap, Cursor, CursorMut, Entry, IntoIter, Iter, IterMut, Keys, Structure,
    Values, ValuesMut,
};
use crate::common::InterchangeableAllocator;
use crate::compare::{Compare, NaturalOrder};
use crate::error::{Error, Result};

/// An ordered map backed by a red-black tree that owns its allocator.
///
/// This is the recommended type for most use cases. It wraps
/// [`AllocatedRbTreeMap`] and provides safe methods without requiring
/// `unsafe` blocks or passing allocators manually.
///
/// Keys are unique under the comparator `C`. Inserting a key that is
/// already present never overwrites the stored element.
///
/// # Example
///
/// ```
/// use allocated_rbtree::RbTreeMap;
///
/// let mut map = RbTreeMap::new();
/// map.insert(10, "a")?;
/// map.insert(20, "b")?;
/// map.insert(30, "c")?;
///
/// assert_eq!(map.find(&20).value(), Some(&"b"));
/// assert!(map.find(&99).is_end());
/// assert!(map.at(&99).is_err());
/// # Ok::<(), allocated_rbtree::Error>(())
/// ```
pub struct RbTreeMap<K, V, C = NaturalOrder, A: Allocator = Global> {
    alloc: A,
    raw: AllocatedRbTreeMap<K, V, C>,
}

impl<K: Ord, V> RbTreeMap<K, V> {
    /// Creates an empty map ordered by `Ord`, using the global allocator.
    ///
    /// # Panics
    ///
    /// Aborts if the global heap cannot provide the sentinel.
    #[inline]
    pub fn new() -> Self {
        Self::with_comparator_in(NaturalOrder, Global)
    }
}

impl<K: Ord, V> Default for RbTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> RbTreeMap<K, V, C> {
    /// Creates an empty map ordered by `cmp`, using the global allocator.
    ///
    /// # Panics
    ///
    /// Aborts if the global heap cannot provide the sentinel.
    #[inline]
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_comparator_in(cmp, Global)
    }
}

impl<K, V, C: Default, A: Allocator> RbTreeMap<K, V, C, A> {
    /// Creates an empty map that allocates its nodes from `alloc`.
    ///
    /// # Panics
    ///
    /// The sentinel is taken from the global heap, not from `alloc`; this
    /// aborts if the global heap is exhausted.
    #[inline]
    pub fn new_in(alloc: A) -> Self {
        Self::with_comparator_in(C::default(), alloc)
    }
}

impl<K, V, C, A: Allocator> Drop for RbTreeMap<K, V, C, A> {
    fn drop(&mut self) {
        // SAFETY: `self.raw` was allocated by `self.alloc`
        unsafe {
            self.raw.drop_in(&self.alloc);
        }
    }
}

impl<K, V, C, A: Allocator> RbTreeMap<K, V, C, A> {
    /// Creates an empty map ordered by `cmp` that allocates from `alloc`.
    ///
    /// # Panics
    ///
    /// Aborts if the global heap cannot provide the sentinel.
    pub fn with_comparator_in(cmp: C, alloc: A) -> Self {
        RbTreeMap {
            alloc,
            raw: AllocatedRbTreeMap::with_comparator(cmp),
        }
    }

    /// Returns the allocator nodes are allocated from.
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Returns the comparator ordering this map.
    #[inline]
    pub fn key_comp(&self) -> &C {
        self.raw.key_comp()
    }

    /// Upper bound on the number of elements, from the node size alone.
    #[inline]
    pub fn max_size(&self) -> usize {
        isize::MAX as usize / mem::size_of::<Node<K, V>>()
    }

    /// Returns the number of elements in the map.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the map contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Returns the first key-value pair in the map.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.raw.first_key_value()
    }

    /// Returns the last key-value pair in the map.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.raw.last_key_value()
    }

    /// Removes and returns the first element.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.pop_first_in(&self.alloc) }
    }

    /// Removes and returns the last element.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.pop_last_in(&self.alloc) }
    }

    /// Removes every element. The map is equivalent to a new one afterwards.
    pub fn clear(&mut self) {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.clear_in(&self.alloc) }
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.raw.iter()
    }

    /// Gets a mutable iterator over the entries of the map, sorted by key.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.raw.iter_mut()
    }

    /// Gets an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        self.raw.keys()
    }

    /// Gets an iterator over the values of the map, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        self.raw.values()
    }

    /// Gets a mutable iterator over the values of the map, in order by key.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        self.raw.values_mut()
    }

    /// Returns a cursor at the first element, or past the end if empty.
    pub fn cursor_front(&self) -> Cursor<'_, K, V, C> {
        self.raw.cursor_front()
    }

    /// Returns a cursor at the last element, or past the end if empty.
    pub fn cursor_back(&self) -> Cursor<'_, K, V, C> {
        self.raw.cursor_back()
    }

    /// Returns a cursor past the last element.
    pub fn cursor_end(&self) -> Cursor<'_, K, V, C> {
        self.raw.cursor_end()
    }

    /// Returns a mutable cursor at the first element.
    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, K, V, C, A> {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.cursor_front_mut_in(&self.alloc) }
    }

    /// Returns a mutable cursor at the last element.
    pub fn cursor_back_mut(&mut self) -> CursorMut<'_, K, V, C, A> {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.cursor_back_mut_in(&self.alloc) }
    }

    /// Exchanges the contents, comparators and allocators of two maps.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Moves every element into a new map, leaving `self` empty. No node is
    /// allocated or freed.
    pub fn take(&mut self) -> Self
    where
        C: Clone,
        A: Clone,
    {
        let mut taken = Self::with_comparator_in(self.key_comp().clone(), self.alloc.clone());
        mem::swap(&mut self.raw, &mut taken.raw);
        taken
    }

    /// Walks the tree breadth-first. See [`AllocatedRbTreeMap::structure`].
    pub fn structure(&self) -> Structure<'_, K, V> {
        self.raw.structure()
    }
}

impl<K, V, C: Compare<K>, A: Allocator> RbTreeMap<K, V, C, A> {
    /// Returns `true` if the map contains an element equivalent to `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.raw.contains_key(key)
    }

    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.raw.get(key)
    }

    /// Returns the key-value pair corresponding to the supplied key.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.raw.get_key_value(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.raw.get_mut(key)
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if no element matches.
    pub fn at(&self, key: &K) -> Result<&V> {
        self.raw.at(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if no element matches.
    pub fn at_mut(&mut self, key: &K) -> Result<&mut V> {
        self.raw.at_mut(key)
    }

    /// Returns a cursor at the element equivalent to `key`, or past the end.
    pub fn find(&self, key: &K) -> Cursor<'_, K, V, C> {
        self.raw.find(key)
    }

    /// Returns a mutable cursor at the element equivalent to `key`, or past
    /// the end.
    pub fn find_mut(&mut self, key: &K) -> CursorMut<'_, K, V, C, A> {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.find_mut_in(&self.alloc, key) }
    }

    /// Gets the given key's corresponding entry in the map for in-place manipulation.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, C, A> {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.entry_in(&self.alloc, key) }
    }

    /// Inserts a key-value pair unless an equivalent key is present.
    ///
    /// Returns a cursor at the element stored under the key and whether the
    /// pair was inserted. An existing element is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`] if the node cannot be allocated.
    /// The map is unchanged in that case.
    pub fn insert(&mut self, key: K, value: V) -> Result<(CursorMut<'_, K, V, C, A>, bool)> {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.insert_in(&self.alloc, key, value) }
    }

    /// Returns the value stored under `key`, first inserting `V::default()`
    /// if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ResourceExhausted`] if the node cannot be allocated.
    pub fn get_or_insert_default(&mut self, key: K) -> Result<&mut V>
    where
        V: Default,
    {
        self.entry(key).or_default()
    }

    /// Removes the element equivalent to `key`, returning its value.
    /// Removing an absent key does nothing.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes the element equivalent to `key`, returning it.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.remove_entry_in(&self.alloc, key) }
    }

    /// Inserts every pair of `iter`, skipping keys already present.
    ///
    /// # Errors
    ///
    /// Stops at the first failed node allocation. Pairs inserted before the
    /// failure stay in the map.
    pub fn try_extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) -> Result<()> {
        // SAFETY: `self.alloc` was used to allocate `self.raw`
        unsafe { self.raw.try_extend_in(&self.alloc, iter) }
    }

    /// Builds a map from `iter` with nodes allocated from `alloc`.
    ///
    /// # Errors
    ///
    /// Returns an error if a node allocation fails.
    pub fn try_from_iter_in<I: IntoIterator<Item = (K, V)>>(iter: I, alloc: A) -> Result<Self>
    where
        C: Default,
    {
        let mut map = Self::new_in(alloc);
        map.try_extend(iter)?;
        Ok(map)
    }

    /// Copies every element into a new map sharing this map's comparator and
    /// allocator.
    ///
    /// # Errors
    ///
    /// Returns an error if a node allocation fails. The partial copy is
    /// dropped.
    pub fn try_clone(&self) -> Result<Self>
    where
        K: Clone,
        V: Clone,
        C: Clone,
        A: Clone,
    {
        self.try_clone_in(self.alloc.clone())
    }

    /// Copies every element into a new map whose nodes come from `alloc`.
    /// The comparator is cloned; this map is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if a node allocation fails. The partial copy is
    /// dropped.
    pub fn try_clone_in<B: Allocator>(&self, alloc: B) -> Result<RbTreeMap<K, V, C, B>>
    where
        K: Clone,
        V: Clone,
        C: Clone,
    {
        let mut copy = RbTreeMap::with_comparator_in(self.key_comp().clone(), alloc);
        for (k, v) in self.iter() {
            copy.insert(k.clone(), v.clone())?;
        }
        log::trace!("rbtree: cloned {} nodes", copy.len());
        Ok(copy)
    }

    /// Moves the map into `alloc`.
    ///
    /// If `alloc` is interchangeable with the current allocator the nodes
    /// change hands without being touched. Otherwise each element is moved
    /// into a node allocated from `alloc` and the old node is freed.
    ///
    /// # Errors
    ///
    /// Returns an error if a node allocation fails while re-inserting. The
    /// elements not yet moved are dropped along with `self`.
    pub fn relocate_in(mut self, alloc: A) -> Result<Self>
    where
        A: InterchangeableAllocator,
        C: Clone,
    {
        let mut moved = Self::with_comparator_in(self.key_comp().clone(), alloc);
        if self.alloc.interchangeable_with(&moved.alloc) {
            mem::swap(&mut self.raw, &mut moved.raw);
            return Ok(moved);
        }
        log::debug!(
            "rbtree: allocators differ, re-inserting {} elements",
            self.len()
        );
        while let Some((k, v)) = self.pop_first() {
            moved.insert(k, v)?;
        }
        Ok(moved)
    }

    /// Checks every red-black invariant. See [`AllocatedRbTreeMap::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] naming the first broken rule.
    pub fn validate(&self) -> Result<()> {
        self.raw.validate()
    }
}

/// Panics on allocation failure, like the standard collections.
fn expect_alloc<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(Error::ResourceExhausted(err)) => err.handle_alloc_error(),
        Err(err) => panic!("rbtree: {err}"),
    }
}

impl<K: Clone, V: Clone, C: Compare<K> + Clone, A: Allocator + Clone> Clone for RbTreeMap<K, V, C, A> {
    fn clone(&self) -> Self {
        expect_alloc(self.try_clone())
    }
}

impl<K, V, C: Compare<K>, A: Allocator> Index<&K> for RbTreeMap<K, V, C, A> {
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &K) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("rbtree: key not found"),
        }
    }
}

impl<K, V, C: Compare<K>, A: Allocator> Extend<(K, V)> for RbTreeMap<K, V, C, A> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        expect_alloc(self.try_extend(iter));
    }
}

impl<K, V, C: Compare<K> + Default> FromIterator<(K, V)> for RbTreeMap<K, V, C> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        expect_alloc(Self::try_from_iter_in(iter, Global))
    }
}

impl<K: PartialEq, V: PartialEq, C, A: InterchangeableAllocator> PartialEq
    for RbTreeMap<K, V, C, A>
{
    fn eq(&self, other: &Self) -> bool {
        self.alloc.interchangeable_with(&other.alloc)
            && self.len() == other.len()
            && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C, A: InterchangeableAllocator> Eq for RbTreeMap<K, V, C, A> {}

impl<K: fmt::Debug, V: fmt::Debug, C, A: Allocator> fmt::Debug for RbTreeMap<K, V, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C, A: Allocator> IntoIterator for RbTreeMap<K, V, C, A> {
    type IntoIter = IntoIter<K, V, C, A>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { map: self }
    }
}

impl<'s, K, V, C, A: Allocator> IntoIterator for &'s RbTreeMap<K, V, C, A> {
    type IntoIter = Iter<'s, K, V>;
    type Item = (&'s K, &'s V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'s, K, V, C, A: Allocator> IntoIterator for &'s mut RbTreeMap<K, V, C, A> {
    type IntoIter = IterMut<'s, K, V>;
    type Item = (&'s K, &'s mut V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
