//! A red-black tree map using the _allocated_ pattern for explicit allocator control.
//!
//! This crate provides an ordered map with unique keys, ordered iteration and
//! logarithmic lookup, insertion and removal. Both the comparison rule and the
//! allocator are chosen by the caller.
//!
//! # Quick Start
//!
//! ```
//! use allocated_rbtree::RbTreeMap;
//!
//! let mut map = RbTreeMap::new();
//! map.insert(1, "one")?;
//! map.insert(2, "two")?;
//! map.insert(3, "three")?;
//!
//! assert_eq!(map.get(&2), Some(&"two"));
//! assert_eq!(map.len(), 3);
//! # Ok::<(), allocated_rbtree::Error>(())
//! ```
//!
//! Inserting a key that is already present leaves the stored element alone
//! and reports that nothing was inserted:
//!
//! ```
//! use allocated_rbtree::RbTreeMap;
//!
//! let mut map = RbTreeMap::new();
//! map.insert(1, "one")?;
//! let (cursor, inserted) = map.insert(1, "uno")?;
//!
//! assert!(!inserted);
//! assert_eq!(cursor.key_value(), Some((&1, &"one")));
//! # Ok::<(), allocated_rbtree::Error>(())
//! ```
//!
//! # The Allocated Pattern
//!
//! This crate follows the _allocated_ pattern, providing two types:
//!
//! ## Wrapper Type (Recommended)
//!
//! - [`RbTreeMap<K, V, C, A>`] - Owns allocator, safe API
//!
//! ```
//! use allocated_rbtree::{RbTreeMap, ReverseOrder};
//!
//! let mut map = RbTreeMap::<_, _, ReverseOrder>::new_in(allocator_api2::alloc::Global);
//! map.insert(1, "one")?;  // No unsafe blocks needed!
//! map.insert(2, "two")?;
//!
//! assert_eq!(map.first_key_value(), Some((&2, &"two")));
//! # Ok::<(), allocated_rbtree::Error>(())
//! ```
//!
//! ## Allocated Type (Advanced)
//!
//! - [`AllocatedRbTreeMap<K, V, C>`] - Low-level, requires manual allocator passing
//!
//! This is for building composite data structures or when you need fine control:
//!
//! ```
//! use allocated::{CountingAllocator, DropIn};
//! use allocated_rbtree::AllocatedRbTreeMap;
//!
//! let alloc = CountingAllocator::default();
//! let mut map = AllocatedRbTreeMap::<u32, String>::new();
//!
//! unsafe {
//!     map.insert_in(&alloc, 1, "one".to_string())?;
//! }
//!
//! // Track memory usage: one allocation per element.
//! assert_eq!(alloc.n_allocations(), 1);
//!
//! unsafe { map.drop_in(&alloc) };
//! # Ok::<(), allocated_rbtree::Error>(())
//! ```
//!
//! # Cursors
//!
//! [`Cursor`] and [`CursorMut`] walk the elements in order. A cursor is
//! either at an element or past the end; stepping back from past the end
//! lands on the last element.
//!
//! ```
//! use allocated_rbtree::RbTreeMap;
//!
//! let map: RbTreeMap<u32, ()> = (1..=3).map(|k| (k, ())).collect();
//!
//! let mut cursor = map.cursor_end();
//! cursor.move_prev();
//! assert_eq!(cursor.key(), Some(&3));
//! cursor.move_next();
//! assert!(cursor.is_end());
//! ```

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

#[cfg(test)]
extern crate std;

extern crate alloc;

mod common;
/// Comparators that define key order.
pub mod compare;
mod error;
/// Red-black tree map implementation.
///
/// This module provides [`rbtree::AllocatedRbTreeMap`] and its wrapper
/// [`rbtree::RbTreeMap`], together with their cursors, entries and
/// iterators.
pub mod rbtree;

pub use common::InterchangeableAllocator;
pub use compare::{Compare, NaturalOrder, ReverseOrder};
pub use error::{Error, Result, Violation};

// Re-export the allocated type for advanced use cases
pub use rbtree::AllocatedRbTreeMap;

// Re-export the wrapper type (recommended for most use cases)
pub use rbtree::RbTreeMap;

pub use rbtree::{Color, Cursor, CursorMut, Entry, NodeView, OccupiedEntry, VacantEntry};
