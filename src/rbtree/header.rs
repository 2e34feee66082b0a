//! Root pointer, per-tree sentinel, and the structural red-black algorithms.
//!
//! Everything here works on type-erased [`Link`]s. Key comparison is
//! injected by the caller as a closure, so this layer never needs to know
//! what a node stores.

use alloc::boxed::Box;
use core::cmp::Ordering;
use core::mem;
use core::ptr::NonNull;

use super::node::{Color, Link, LinkPtr};

/// Outcome of [`Header::search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Search {
    /// A node equivalent to the probe.
    Found(LinkPtr),
    /// No match. A new node belongs under `parent` (the last node visited,
    /// or the sentinel for an empty tree) on the side given by `left`.
    Vacant { parent: LinkPtr, left: bool },
}

/// The root and sentinel of one tree.
///
/// Invariants:
/// - every link reachable from `root` is live and owned by this header;
/// - `root == nil` iff the tree is empty;
/// - `nil` is black and its `left`/`right` point to itself;
/// - `root`'s parent is `nil`.
///
/// Only the sentinel's `parent` is ever written while the tree is being
/// restructured, and [`extract`](Header::extract) resets it before returning.
pub(crate) struct Header {
    pub(crate) root: LinkPtr,
    pub(crate) nil: LinkPtr,
}

impl Header {
    pub(crate) fn new() -> Self {
        let dangling = NonNull::dangling();
        let nil = NonNull::from(Box::leak(Box::new(Link {
            parent: dangling,
            left: dangling,
            right: dangling,
            color: Color::Black,
        })));
        // SAFETY: `nil` was just allocated and is not shared yet.
        unsafe {
            Link::set_parent(nil, nil);
            Link::set_left(nil, nil);
            Link::set_right(nil, nil);
        }
        Header { root: nil, nil }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.root == self.nil
    }

    /// Leftmost node of the subtree rooted at `link`.
    pub(crate) fn first_from(&self, mut link: LinkPtr) -> LinkPtr {
        // SAFETY: links reachable from the root are live.
        unsafe {
            while Link::left(link) != self.nil {
                link = Link::left(link);
            }
        }
        link
    }

    /// Rightmost node of the subtree rooted at `link`.
    pub(crate) fn last_from(&self, mut link: LinkPtr) -> LinkPtr {
        // SAFETY: links reachable from the root are live.
        unsafe {
            while Link::right(link) != self.nil {
                link = Link::right(link);
            }
        }
        link
    }

    /// Smallest node, or `None` for an empty tree.
    pub(crate) fn first(&self) -> Option<LinkPtr> {
        (!self.is_empty()).then(|| self.first_from(self.root))
    }

    /// Largest node, or `None` for an empty tree.
    pub(crate) fn last(&self) -> Option<LinkPtr> {
        (!self.is_empty()).then(|| self.last_from(self.root))
    }

    /// In-order successor of `link`, or `None` if it is the largest node.
    pub(crate) fn successor(&self, mut link: LinkPtr) -> Option<LinkPtr> {
        // SAFETY: links reachable from the root are live.
        unsafe {
            if Link::right(link) != self.nil {
                return Some(self.first_from(Link::right(link)));
            }
            let mut parent = Link::parent(link);
            while parent != self.nil && link == Link::right(parent) {
                link = parent;
                parent = Link::parent(parent);
            }
            (parent != self.nil).then_some(parent)
        }
    }

    /// In-order predecessor of `link`, or `None` if it is the smallest node.
    pub(crate) fn predecessor(&self, mut link: LinkPtr) -> Option<LinkPtr> {
        // SAFETY: links reachable from the root are live.
        unsafe {
            if Link::left(link) != self.nil {
                return Some(self.last_from(Link::left(link)));
            }
            let mut parent = Link::parent(link);
            while parent != self.nil && link == Link::left(parent) {
                link = parent;
                parent = Link::parent(parent);
            }
            (parent != self.nil).then_some(parent)
        }
    }

    /// Descends from the root. `probe` orders the target relative to the
    /// node it is handed: `Less` goes left, `Greater` goes right.
    pub(crate) fn search(&self, mut probe: impl FnMut(LinkPtr) -> Ordering) -> Search {
        let mut parent = self.nil;
        let mut left = false;
        let mut link = self.root;
        while link != self.nil {
            parent = link;
            // SAFETY: `link` is reachable from the root, so it is live.
            unsafe {
                match probe(link) {
                    Ordering::Less => {
                        left = true;
                        link = Link::left(link);
                    }
                    Ordering::Greater => {
                        left = false;
                        link = Link::right(link);
                    }
                    Ordering::Equal => return Search::Found(link),
                }
            }
        }
        Search::Vacant { parent, left }
    }

    /// Puts `new` where `old` hangs from its parent (or at the root) and sets
    /// `new`'s parent. `old` keeps its own links.
    ///
    /// # Safety
    ///
    /// `old` must be a node of this tree; `new` a node or the sentinel.
    unsafe fn transplant(&mut self, old: LinkPtr, new: LinkPtr) {
        // SAFETY: guaranteed by the caller.
        unsafe {
            let parent = Link::parent(old);
            if parent == self.nil {
                self.root = new;
            } else if old == Link::left(parent) {
                Link::set_left(parent, new);
            } else {
                Link::set_right(parent, new);
            }
            Link::set_parent(new, parent);
        }
    }

    /// # Safety
    ///
    /// `x` must be a node of this tree with a real right child.
    unsafe fn rotate_left(&mut self, x: LinkPtr) {
        // SAFETY: guaranteed by the caller; every link touched is reachable
        // from `x`.
        unsafe {
            let y = Link::right(x);
            let inner = Link::left(y);
            Link::set_right(x, inner);
            if inner != self.nil {
                Link::set_parent(inner, x);
            }
            self.transplant(x, y);
            Link::set_left(y, x);
            Link::set_parent(x, y);
        }
    }

    /// # Safety
    ///
    /// `y` must be a node of this tree with a real left child.
    unsafe fn rotate_right(&mut self, y: LinkPtr) {
        // SAFETY: guaranteed by the caller; every link touched is reachable
        // from `y`.
        unsafe {
            let x = Link::left(y);
            let inner = Link::right(x);
            Link::set_left(y, inner);
            if inner != self.nil {
                Link::set_parent(inner, y);
            }
            self.transplant(y, x);
            Link::set_right(x, y);
            Link::set_parent(y, x);
        }
    }

    /// Links a detached node as a red leaf and rebalances.
    ///
    /// # Safety
    ///
    /// `link` must be a live node not yet in any tree, and `parent`/`left`
    /// must come from a [`Search::Vacant`] produced by this header with no
    /// mutation in between.
    pub(crate) unsafe fn insert(&mut self, link: LinkPtr, parent: LinkPtr, left: bool) {
        // SAFETY: guaranteed by the caller.
        unsafe {
            Link::set_parent(link, parent);
            Link::set_left(link, self.nil);
            Link::set_right(link, self.nil);
            Link::set_color(link, Color::Red);
            if parent == self.nil {
                self.root = link;
            } else if left {
                Link::set_left(parent, link);
            } else {
                Link::set_right(parent, link);
            }
            self.insert_fixup(link);
        }
    }

    /// # Safety
    ///
    /// `node` must be a red node of this tree whose only possible violation
    /// is a red parent.
    unsafe fn insert_fixup(&mut self, mut node: LinkPtr) {
        // SAFETY: guaranteed by the caller. A red parent is never the root,
        // so the grandparent is a real node.
        unsafe {
            while Link::color(Link::parent(node)) == Color::Red {
                let parent = Link::parent(node);
                let grandparent = Link::parent(parent);
                if parent == Link::left(grandparent) {
                    let uncle = Link::right(grandparent);
                    if Link::color(uncle) == Color::Red {
                        Link::set_color(parent, Color::Black);
                        Link::set_color(uncle, Color::Black);
                        Link::set_color(grandparent, Color::Red);
                        node = grandparent;
                    } else {
                        if node == Link::right(parent) {
                            node = parent;
                            self.rotate_left(node);
                        }
                        let parent = Link::parent(node);
                        let grandparent = Link::parent(parent);
                        Link::set_color(parent, Color::Black);
                        Link::set_color(grandparent, Color::Red);
                        self.rotate_right(grandparent);
                    }
                } else {
                    let uncle = Link::left(grandparent);
                    if Link::color(uncle) == Color::Red {
                        Link::set_color(parent, Color::Black);
                        Link::set_color(uncle, Color::Black);
                        Link::set_color(grandparent, Color::Red);
                        node = grandparent;
                    } else {
                        if node == Link::left(parent) {
                            node = parent;
                            self.rotate_right(node);
                        }
                        let parent = Link::parent(node);
                        let grandparent = Link::parent(parent);
                        Link::set_color(parent, Color::Black);
                        Link::set_color(grandparent, Color::Red);
                        self.rotate_left(grandparent);
                    }
                }
            }
            Link::set_color(self.root, Color::Black);
        }
    }

    /// Unlinks `node` from the tree and rebalances. The node's own links are
    /// left dangling; the caller owns its storage afterwards.
    ///
    /// # Safety
    ///
    /// `node` must be a node of this tree.
    pub(crate) unsafe fn extract(&mut self, node: LinkPtr) {
        // SAFETY: guaranteed by the caller; all other links touched are
        // reachable from the root or are the sentinel.
        unsafe {
            let nil = self.nil;
            let mut removed_color = Link::color(node);
            let fixup;

            if Link::left(node) == nil {
                fixup = Link::right(node);
                self.transplant(node, fixup);
            } else if Link::right(node) == nil {
                fixup = Link::left(node);
                self.transplant(node, fixup);
            } else {
                // Two children: the in-order successor takes `node`'s place
                // and colour, and its own right subtree fills the gap it
                // leaves.
                let successor = self.first_from(Link::right(node));
                removed_color = Link::color(successor);
                fixup = Link::right(successor);
                if Link::parent(successor) == node {
                    Link::set_parent(fixup, successor);
                } else {
                    self.transplant(successor, fixup);
                    Link::set_right(successor, Link::right(node));
                    Link::set_parent(Link::right(successor), successor);
                }
                self.transplant(node, successor);
                Link::set_left(successor, Link::left(node));
                Link::set_parent(Link::left(successor), successor);
                Link::set_color(successor, Link::color(node));
            }

            if removed_color == Color::Black {
                self.extract_fixup(fixup);
            }
            Link::set_parent(nil, nil);
        }
    }

    /// # Safety
    ///
    /// `node` must carry an extra black: a node of this tree, or the
    /// sentinel with its parent set to where the sentinel now hangs.
    unsafe fn extract_fixup(&mut self, mut node: LinkPtr) {
        // SAFETY: guaranteed by the caller. A doubly black node always has a
        // real sibling, since the sibling's side has black height >= 1.
        unsafe {
            while node != self.root && Link::color(node) == Color::Black {
                let parent = Link::parent(node);
                if node == Link::left(parent) {
                    let mut sibling = Link::right(parent);
                    if Link::color(sibling) == Color::Red {
                        Link::set_color(sibling, Color::Black);
                        Link::set_color(parent, Color::Red);
                        self.rotate_left(parent);
                        sibling = Link::right(parent);
                    }
                    if Link::color(Link::left(sibling)) == Color::Black
                        && Link::color(Link::right(sibling)) == Color::Black
                    {
                        Link::set_color(sibling, Color::Red);
                        node = parent;
                    } else {
                        if Link::color(Link::right(sibling)) == Color::Black {
                            Link::set_color(Link::left(sibling), Color::Black);
                            Link::set_color(sibling, Color::Red);
                            self.rotate_right(sibling);
                            sibling = Link::right(parent);
                        }
                        Link::set_color(sibling, Link::color(parent));
                        Link::set_color(parent, Color::Black);
                        Link::set_color(Link::right(sibling), Color::Black);
                        self.rotate_left(parent);
                        node = self.root;
                    }
                } else {
                    let mut sibling = Link::left(parent);
                    if Link::color(sibling) == Color::Red {
                        Link::set_color(sibling, Color::Black);
                        Link::set_color(parent, Color::Red);
                        self.rotate_right(parent);
                        sibling = Link::left(parent);
                    }
                    if Link::color(Link::right(sibling)) == Color::Black
                        && Link::color(Link::left(sibling)) == Color::Black
                    {
                        Link::set_color(sibling, Color::Red);
                        node = parent;
                    } else {
                        if Link::color(Link::left(sibling)) == Color::Black {
                            Link::set_color(Link::right(sibling), Color::Black);
                            Link::set_color(sibling, Color::Red);
                            self.rotate_left(sibling);
                            sibling = Link::left(parent);
                        }
                        Link::set_color(sibling, Link::color(parent));
                        Link::set_color(parent, Color::Black);
                        Link::set_color(Link::left(sibling), Color::Black);
                        self.rotate_right(parent);
                        node = self.root;
                    }
                }
            }
            Link::set_color(node, Color::Black);
        }
    }

    /// Removes every node in post order, handing each to `destroy` once it
    /// has been unlinked. Always continues with the deepest leftmost node, so
    /// a node is destroyed only after both its children are the sentinel.
    ///
    /// The root is detached first. If `destroy` unwinds, the header is
    /// already empty and the nodes not yet visited are leaked.
    ///
    /// # Safety
    ///
    /// `destroy` receives each node exactly once and must not touch the tree.
    pub(crate) unsafe fn clear(&mut self, mut destroy: impl FnMut(LinkPtr)) {
        let nil = self.nil;
        let mut link = mem::replace(&mut self.root, nil);
        // SAFETY: guaranteed by the caller; `link` is always reachable from
        // the detached root or is the sentinel, which ends the loop.
        unsafe {
            while link != nil {
                if Link::left(link) != nil {
                    link = Link::left(link);
                } else if Link::right(link) != nil {
                    link = Link::right(link);
                } else {
                    let parent = Link::parent(link);
                    if parent != nil {
                        if Link::left(parent) == link {
                            Link::set_left(parent, nil);
                        } else {
                            Link::set_right(parent, nil);
                        }
                    }
                    destroy(link);
                    link = parent;
                }
            }
        }
    }
}

impl Drop for Header {
    fn drop(&mut self) {
        // SAFETY: `nil` came from `Box::leak` in `new` and is freed only here.
        unsafe { drop(Box::from_raw(self.nil.as_ptr())) };
    }
}
