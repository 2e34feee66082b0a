use core::ptr::NonNull;

/// Pointer to the structural part of a node, or to a tree's sentinel.
pub(crate) type LinkPtr = NonNull<Link>;

/// Node colour. The sentinel is always black.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Black,
}

/// The type-erased links shared by every node and by the sentinel.
///
/// `left` and `right` always point at a real node or at the owning tree's
/// sentinel, never at nothing.
#[repr(C)]
#[derive(Debug)]
pub(crate) struct Link {
    pub(crate) parent: LinkPtr,
    pub(crate) left: LinkPtr,
    pub(crate) right: LinkPtr,
    pub(crate) color: Color,
}

// The accessors below read and write through raw links. Each requires that
// the pointer refers to a live `Link`: a node owned by a tree, or that tree's
// sentinel.
impl Link {
    /// # Safety
    ///
    /// `this` must point to a live link.
    #[inline]
    pub(crate) unsafe fn parent(this: LinkPtr) -> LinkPtr {
        // SAFETY: guaranteed by the caller.
        unsafe { (*this.as_ptr()).parent }
    }

    /// # Safety
    ///
    /// `this` must point to a live link.
    #[inline]
    pub(crate) unsafe fn left(this: LinkPtr) -> LinkPtr {
        // SAFETY: guaranteed by the caller.
        unsafe { (*this.as_ptr()).left }
    }

    /// # Safety
    ///
    /// `this` must point to a live link.
    #[inline]
    pub(crate) unsafe fn right(this: LinkPtr) -> LinkPtr {
        // SAFETY: guaranteed by the caller.
        unsafe { (*this.as_ptr()).right }
    }

    /// # Safety
    ///
    /// `this` must point to a live link.
    #[inline]
    pub(crate) unsafe fn color(this: LinkPtr) -> Color {
        // SAFETY: guaranteed by the caller.
        unsafe { (*this.as_ptr()).color }
    }

    /// # Safety
    ///
    /// `this` must point to a live link with no outstanding references.
    #[inline]
    pub(crate) unsafe fn set_parent(this: LinkPtr, parent: LinkPtr) {
        // SAFETY: guaranteed by the caller.
        unsafe { (*this.as_ptr()).parent = parent }
    }

    /// # Safety
    ///
    /// `this` must point to a live link with no outstanding references.
    #[inline]
    pub(crate) unsafe fn set_left(this: LinkPtr, left: LinkPtr) {
        // SAFETY: guaranteed by the caller.
        unsafe { (*this.as_ptr()).left = left }
    }

    /// # Safety
    ///
    /// `this` must point to a live link with no outstanding references.
    #[inline]
    pub(crate) unsafe fn set_right(this: LinkPtr, right: LinkPtr) {
        // SAFETY: guaranteed by the caller.
        unsafe { (*this.as_ptr()).right = right }
    }

    /// # Safety
    ///
    /// `this` must point to a live link with no outstanding references.
    #[inline]
    pub(crate) unsafe fn set_color(this: LinkPtr, color: Color) {
        // SAFETY: guaranteed by the caller.
        unsafe { (*this.as_ptr()).color = color }
    }
}

/// A link extended with its key and value.
///
/// `link` is the first field of a `#[repr(C)]` struct, so a pointer to the
/// node and a pointer to its link share an address.
#[repr(C)]
pub(crate) struct Node<K, V> {
    // Only ever reached through `LinkPtr` casts.
    #[allow(dead_code)]
    link: Link,
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K, V> Node<K, V> {
    /// A detached red node whose links all point at `nil`.
    pub(crate) fn new(key: K, value: V, nil: LinkPtr) -> Self {
        Node {
            link: Link {
                parent: nil,
                left: nil,
                right: nil,
                color: Color::Red,
            },
            key,
            value,
        }
    }

    #[inline]
    pub(crate) fn link(node: NonNull<Self>) -> LinkPtr {
        node.cast()
    }

    /// # Safety
    ///
    /// `link` must be the link of a `Node<K, V>`, never a sentinel.
    #[inline]
    pub(crate) unsafe fn from_link(link: LinkPtr) -> NonNull<Self> {
        link.cast()
    }

    /// # Safety
    ///
    /// `link` must be the link of a live `Node<K, V>` that outlives `'a`, and
    /// no mutable reference to it may exist during `'a`.
    #[inline]
    pub(crate) unsafe fn key_value<'a>(link: LinkPtr) -> (&'a K, &'a V) {
        // SAFETY: guaranteed by the caller.
        let node = unsafe { Self::from_link(link) }.as_ptr();
        // SAFETY: guaranteed by the caller. Only the key and value fields are
        // borrowed, so the links stay reachable through raw pointers.
        unsafe { (&(*node).key, &(*node).value) }
    }

    /// # Safety
    ///
    /// `link` must be the link of a live `Node<K, V>` that outlives `'a`, and
    /// no other reference to its value may exist during `'a`.
    #[inline]
    pub(crate) unsafe fn key_value_mut<'a>(link: LinkPtr) -> (&'a K, &'a mut V) {
        // SAFETY: guaranteed by the caller.
        let node = unsafe { Self::from_link(link) }.as_ptr();
        // SAFETY: guaranteed by the caller. Only the key and value fields are
        // borrowed, so the links stay reachable through raw pointers.
        unsafe { (&(*node).key, &mut (*node).value) }
    }
}
