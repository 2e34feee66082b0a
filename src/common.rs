use allocator_api2::alloc::{Allocator, Global};

/// An allocator that can tell whether another instance may release its memory.
///
/// Two interchangeable allocators can take over each other's nodes, so a map
/// can change hands between them without copying. Map equality also requires
/// interchangeable allocators.
pub trait InterchangeableAllocator: Allocator {
    /// Returns `true` if memory from `self` may be deallocated through `other`
    /// and vice versa.
    fn interchangeable_with(&self, other: &Self) -> bool;
}

impl InterchangeableAllocator for Global {
    #[inline]
    fn interchangeable_with(&self, _other: &Self) -> bool {
        true
    }
}

impl<A: Allocator + ?Sized> InterchangeableAllocator for &A {
    #[inline]
    fn interchangeable_with(&self, other: &Self) -> bool {
        core::ptr::eq(*self, *other)
    }
}
