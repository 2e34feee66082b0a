use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use allocator_api2::alloc::{Allocator, Global};

use super::header::Header;
use super::node::{LinkPtr, Node};
use super::wrapper::RbTreeMap;
use crate::compare::NaturalOrder;

/// An iterator over the key-value pairs of a map, in order.
///
/// This struct is created by the [`iter`](super::AllocatedRbTreeMap::iter)
/// method on [`AllocatedRbTreeMap`](super::AllocatedRbTreeMap) and
/// [`RbTreeMap`].
pub struct Iter<'a, K, V> {
    header: &'a Header,
    front: Option<LinkPtr>,
    back: Option<LinkPtr>,
    len: usize,
    marker: PhantomData<(&'a K, &'a V)>,
}

// SAFETY: `Iter` only hands out shared references to keys and values.
unsafe impl<'a, K: Sync, V: Sync> Send for Iter<'a, K, V> {}
// SAFETY: as above.
unsafe impl<'a, K: Sync, V: Sync> Sync for Iter<'a, K, V> {}

impl<'a, K, V> Iter<'a, K, V> {
    pub(super) fn new(header: &'a Header, len: usize) -> Self {
        Iter {
            header,
            front: header.first(),
            back: header.last(),
            len,
            marker: PhantomData,
        }
    }
}

impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Iter {
            header: self.header,
            front: self.front,
            back: self.back,
            len: self.len,
            marker: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let link = self.front?;
        self.len -= 1;
        self.front = self.header.successor(link);
        // SAFETY: the iterator borrows the map for `'a`.
        Some(unsafe { Node::key_value(link) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let link = self.back?;
        self.len -= 1;
        self.back = self.header.predecessor(link);
        // SAFETY: the iterator borrows the map for `'a`.
        Some(unsafe { Node::key_value(link) })
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}
impl<'a, K, V> FusedIterator for Iter<'a, K, V> {}

impl<'a, K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'a, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An iterator over the key-value pairs of a map, in order, with mutable
/// values.
pub struct IterMut<'a, K, V> {
    header: &'a Header,
    front: Option<LinkPtr>,
    back: Option<LinkPtr>,
    len: usize,
    marker: PhantomData<(&'a K, &'a mut V)>,
}

// SAFETY: `IterMut` hands out shared keys and unique values, like
// `(&K, &mut V)`.
unsafe impl<'a, K: Sync, V: Send> Send for IterMut<'a, K, V> {}
// SAFETY: shared access to an `IterMut` exposes nothing.
unsafe impl<'a, K: Sync, V: Sync> Sync for IterMut<'a, K, V> {}

impl<'a, K, V> IterMut<'a, K, V> {
    /// The caller must hold the map's exclusive borrow for `'a`.
    pub(super) fn new(header: &'a Header, len: usize) -> Self {
        IterMut {
            header,
            front: header.first(),
            back: header.last(),
            len,
            marker: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let link = self.front?;
        self.len -= 1;
        self.front = self.header.successor(link);
        // SAFETY: the map is exclusively borrowed for `'a` and `len` stops
        // both ends before they yield the same node twice.
        Some(unsafe { Node::key_value_mut(link) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, K, V> DoubleEndedIterator for IterMut<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let link = self.back?;
        self.len -= 1;
        self.back = self.header.predecessor(link);
        // SAFETY: as in `next`.
        Some(unsafe { Node::key_value_mut(link) })
    }
}

impl<'a, K, V> ExactSizeIterator for IterMut<'a, K, V> {}
impl<'a, K, V> FusedIterator for IterMut<'a, K, V> {}

/// An iterator over the keys of a map, in order.
pub struct Keys<'a, K, V> {
    pub(super) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Clone for Keys<'a, K, V> {
    fn clone(&self) -> Self {
        Keys {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Keys<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<'a, K, V> ExactSizeIterator for Keys<'a, K, V> {}
impl<'a, K, V> FusedIterator for Keys<'a, K, V> {}

/// An iterator over the values of a map, in key order.
pub struct Values<'a, K, V> {
    pub(super) inner: Iter<'a, K, V>,
}

impl<'a, K, V> Clone for Values<'a, K, V> {
    fn clone(&self) -> Self {
        Values {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for Values<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<'a, K, V> ExactSizeIterator for Values<'a, K, V> {}
impl<'a, K, V> FusedIterator for Values<'a, K, V> {}

/// A mutable iterator over the values of a map, in key order.
pub struct ValuesMut<'a, K, V> {
    pub(super) inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for ValuesMut<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<'a, K, V> ExactSizeIterator for ValuesMut<'a, K, V> {}
impl<'a, K, V> FusedIterator for ValuesMut<'a, K, V> {}

/// An owning iterator over the key-value pairs of an [`RbTreeMap`], in
/// order. Each node is freed as its pair is yielded; the rest are freed when
/// the iterator is dropped.
pub struct IntoIter<K, V, C = NaturalOrder, A: Allocator = Global> {
    pub(super) map: RbTreeMap<K, V, C, A>,
}

impl<K, V, C, A: Allocator> Iterator for IntoIter<K, V, C, A> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.map.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.map.len(), Some(self.map.len()))
    }
}

impl<K, V, C, A: Allocator> DoubleEndedIterator for IntoIter<K, V, C, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.map.pop_last()
    }
}

impl<K, V, C, A: Allocator> ExactSizeIterator for IntoIter<K, V, C, A> {}
impl<K, V, C, A: Allocator> FusedIterator for IntoIter<K, V, C, A> {}
