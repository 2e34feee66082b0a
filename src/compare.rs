//! Comparison rules used to order keys.
//!
//! A tree is parameterised by a [`Compare`] implementation, a strict weak
//! ordering expressed as a "less than" predicate. Two keys for which neither
//! is less than the other are *equivalent* and collapse to a single element.

use core::cmp::Ordering;

/// A strict weak ordering over `K`.
///
/// Any `Fn(&K, &K) -> bool` closure is a comparator:
///
/// ```
/// use allocated_rbtree::RbTreeMap;
///
/// let mut map = RbTreeMap::with_comparator(|a: &u32, b: &u32| a > b);
/// map.insert(1, "one")?;
/// map.insert(2, "two")?;
///
/// assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![2, 1]);
/// # Ok::<(), allocated_rbtree::Error>(())
/// ```
pub trait Compare<K: ?Sized> {
    /// Returns `true` if `lhs` is ordered strictly before `rhs`.
    fn less(&self, lhs: &K, rhs: &K) -> bool;

    /// Returns `true` if neither key is ordered before the other.
    #[inline]
    fn equivalent(&self, lhs: &K, rhs: &K) -> bool {
        !self.less(lhs, rhs) && !self.less(rhs, lhs)
    }

    /// Three-way comparison derived from [`less`](Compare::less).
    #[inline]
    fn order(&self, lhs: &K, rhs: &K) -> Ordering {
        if self.less(lhs, rhs) {
            Ordering::Less
        } else if self.less(rhs, lhs) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

/// Orders keys by their [`Ord`] implementation, smallest first.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> Compare<K> for NaturalOrder {
    #[inline]
    fn less(&self, lhs: &K, rhs: &K) -> bool {
        lhs < rhs
    }

    #[inline]
    fn order(&self, lhs: &K, rhs: &K) -> Ordering {
        lhs.cmp(rhs)
    }
}

/// Orders keys by their [`Ord`] implementation, largest first.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReverseOrder;

impl<K: Ord + ?Sized> Compare<K> for ReverseOrder {
    #[inline]
    fn less(&self, lhs: &K, rhs: &K) -> bool {
        lhs > rhs
    }

    #[inline]
    fn order(&self, lhs: &K, rhs: &K) -> Ordering {
        rhs.cmp(lhs)
    }
}

impl<K: ?Sized, F: Fn(&K, &K) -> bool> Compare<K> for F {
    #[inline]
    fn less(&self, lhs: &K, rhs: &K) -> bool {
        self(lhs, rhs)
    }
}
