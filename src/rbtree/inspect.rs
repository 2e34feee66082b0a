//! Read-only views of the tree shape, for diagnostics and tests.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use super::header::Header;
use super::node::{Color, Link, LinkPtr, Node};
use super::AllocatedRbTreeMap;
use crate::compare::Compare;
use crate::error::{Result, Violation};

/// One node of the tree as seen by [`structure`](AllocatedRbTreeMap::structure).
///
/// `id` is the node's position in breadth-first order, so the root is `0`.
/// Child links refer to those ids; a missing child is the sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeView<'a, K, V> {
    pub id: usize,
    pub key: &'a K,
    pub value: &'a V,
    pub color: Color,
    pub left: Option<usize>,
    pub right: Option<usize>,
}

/// Breadth-first iterator over the nodes of a tree.
pub struct Structure<'a, K, V> {
    header: &'a Header,
    queue: VecDeque<LinkPtr>,
    next_id: usize,
    marker: PhantomData<(&'a K, &'a V)>,
}

impl<'a, K, V> Structure<'a, K, V> {
    fn new(header: &'a Header) -> Self {
        let mut queue = VecDeque::new();
        if !header.is_empty() {
            queue.push_back(header.root);
        }
        Structure {
            header,
            queue,
            next_id: 1,
            marker: PhantomData,
        }
    }

    fn enqueue(&mut self, link: LinkPtr) -> Option<usize> {
        if link == self.header.nil {
            return None;
        }
        self.queue.push_back(link);
        let id = self.next_id;
        self.next_id += 1;
        Some(id)
    }
}

impl<'a, K, V> Iterator for Structure<'a, K, V> {
    type Item = NodeView<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let link = self.queue.pop_front()?;
        // Ids are handed out in enqueue order, which is also dequeue order.
        let id = self.next_id - self.queue.len() - 1;
        // SAFETY: every queued link is a live node of the borrowed tree.
        let (left, right, color, (key, value)) = unsafe {
            (
                Link::left(link),
                Link::right(link),
                Link::color(link),
                Node::<K, V>::key_value(link),
            )
        };
        let left = self.enqueue(left);
        let right = self.enqueue(right);
        Some(NodeView {
            id,
            key,
            value,
            color,
            left,
            right,
        })
    }
}

impl<'a, K, V> FusedIterator for Structure<'a, K, V> {}

impl<K, V, C> AllocatedRbTreeMap<K, V, C> {
    /// Walks the tree breadth-first, reporting each node's key, value,
    /// colour and children. The tree is not modified.
    pub fn structure(&self) -> Structure<'_, K, V> {
        Structure::new(&self.header)
    }

    /// Walks every node checking the red-black rules and parent links.
    fn check_shape(&self) -> core::result::Result<usize, Violation> {
        let header = &self.header;
        let nil = header.nil;
        // SAFETY: the sentinel and every link reachable from the root are
        // live for as long as `self` is borrowed.
        unsafe {
            if Link::color(nil) != Color::Black
                || Link::left(nil) != nil
                || Link::right(nil) != nil
                || Link::parent(nil) != nil
            {
                return Err(Violation::CorruptSentinel);
            }
            if header.is_empty() {
                return Ok(0);
            }
            if Link::color(header.root) != Color::Black {
                return Err(Violation::RedRoot);
            }

            let mut counted = 0;
            let mut black_height = None;
            // (node, expected parent, black nodes above it)
            let mut stack = Vec::from([(header.root, nil, 0usize)]);
            while let Some((link, parent, blacks)) = stack.pop() {
                if link == nil {
                    match black_height {
                        None => black_height = Some(blacks),
                        Some(expected) if expected != blacks => {
                            return Err(Violation::BlackHeight {
                                expected,
                                found: blacks,
                            });
                        }
                        Some(_) => {}
                    }
                    continue;
                }
                counted += 1;
                if Link::parent(link) != parent {
                    return Err(Violation::BrokenParentLink);
                }
                let color = Link::color(link);
                if color == Color::Red && parent != nil && Link::color(parent) == Color::Red {
                    return Err(Violation::RedRedEdge);
                }
                let blacks = blacks + usize::from(color == Color::Black);
                stack.push((Link::right(link), link, blacks));
                stack.push((Link::left(link), link, blacks));
            }
            Ok(counted)
        }
    }
}

impl<K, V, C: Compare<K>> AllocatedRbTreeMap<K, V, C> {
    /// Checks every red-black invariant, the ordering of keys under the
    /// comparator, and the stored length.
    ///
    /// This is a diagnostic walk over the whole tree. A map only ever
    /// mutated through this crate always passes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`](crate::Error::InvariantViolation)
    /// naming the first broken rule found.
    pub fn validate(&self) -> Result<()> {
        let result = self.check_shape().and_then(|counted| {
            if counted != self.len {
                return Err(Violation::LengthMismatch {
                    stored: self.len,
                    counted,
                });
            }
            let mut keys = self.keys();
            if let Some(mut prev) = keys.next() {
                for key in keys {
                    if !self.cmp.less(prev, key) {
                        return Err(Violation::Unordered);
                    }
                    prev = key;
                }
            }
            Ok(())
        });
        if let Err(violation) = result {
            log::debug!("rbtree: validation failed: {violation}");
        }
        Ok(result?)
    }
}
