#![allow(
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block
)]

use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use core::cell::Cell;
use core::mem::size_of;
use core::ptr::NonNull;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::panic::{self, AssertUnwindSafe};

use proptest::prelude::*;

use itertools::assert_equal;

use allocated::{CountingAllocator, DropIn};
use allocator_api2::alloc::{AllocError, Allocator, Global, Layout};

use super::node::Link;
use super::*;
use crate::compare::ReverseOrder;
use crate::error::Violation;

type TestResult = core::result::Result<(), Box<dyn StdError>>;

/// Hands out at most `budget` allocations from the global allocator.
struct Budgeted {
    remaining: Cell<usize>,
}

impl Budgeted {
    fn new(budget: usize) -> Self {
        Budgeted {
            remaining: Cell::new(budget),
        }
    }
}

unsafe impl Allocator for Budgeted {
    fn allocate(&self, layout: Layout) -> core::result::Result<NonNull<[u8]>, AllocError> {
        match self.remaining.get() {
            0 => Err(AllocError),
            n => {
                self.remaining.set(n - 1);
                Global.allocate(layout)
            }
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { Global.deallocate(ptr, layout) }
    }
}

/// Counts the steps a cursor takes from the front to the end.
fn steps_forward<K, V, C>(mut cursor: Cursor<'_, K, V, C>) -> usize {
    let mut steps = 0;
    while !cursor.is_end() {
        steps += 1;
        cursor.move_next();
    }
    steps
}

/// Counts the steps a cursor takes from the back to the end.
fn steps_backward<K, V, C>(mut cursor: Cursor<'_, K, V, C>) -> usize {
    let mut steps = 0;
    while !cursor.is_end() {
        steps += 1;
        cursor.move_prev();
    }
    steps
}

/// A value whose destructor panics when armed.
struct PanicOnDrop(bool);

impl Drop for PanicOnDrop {
    fn drop(&mut self) {
        if self.0 {
            panic!("value destructor failed");
        }
    }
}

fn assert_allocations<A: Allocator>(alloc: &CountingAllocator<A>, n_nodes: usize) {
    assert_eq!(alloc.net_allocations(), 0);
    assert_eq!(alloc.net_bytes_allocated(), 0);
    assert_eq!(alloc.n_allocations(), n_nodes);
    assert_eq!(alloc.n_deallocations(), n_nodes);
    assert_eq!(
        alloc.n_bytes_allocated(),
        n_nodes * size_of::<Node<u32, u32>>()
    );
}

#[test]
fn test_constructor() -> TestResult {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new();

    assert_eq!(tree.len(), 0);
    assert!(tree.is_empty());
    assert_equal(tree.iter().map(|(k, v)| (*k, *v)), vec![]);
    assert!(!tree.contains_key(&1));
    assert_eq!(tree.get(&1), None);
    assert_eq!(tree.first_key_value(), None);
    assert_eq!(tree.last_key_value(), None);
    assert!(tree.cursor_front().is_end());
    assert!(tree.cursor_back().is_end());
    tree.validate()?;

    unsafe {
        assert_eq!(tree.pop_first_in(&alloc), None);
        tree.drop_in(&alloc);
    }

    assert_allocations(&alloc, 0);

    Ok(())
}

#[test]
fn test_insert_in_order() -> TestResult {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new();

    unsafe {
        for i in 0..64 {
            let (cursor, inserted) = tree.insert_in(&alloc, i, i * 2)?;
            assert!(inserted);
            assert_eq!(cursor.key_value(), Some((&i, &(i * 2))));
            tree.validate()?;
        }

        assert_eq!(tree.len(), 64);
        assert_equal(tree.iter().map(|(k, v)| (*k, *v)), (0..64).map(|i| (i, i * 2)));
        assert_eq!(tree.first_key_value(), Some((&0, &0)));
        assert_eq!(tree.last_key_value(), Some((&63, &126)));

        tree.drop_in(&alloc);
    }

    assert_allocations(&alloc, 64);

    Ok(())
}

#[test]
fn test_insert_out_of_order() -> TestResult {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new();
    let keys = [50, 20, 80, 10, 30, 70, 90, 25, 35, 5, 1, 99, 60, 65];

    unsafe {
        for &k in &keys {
            tree.insert_in(&alloc, k, k + 1)?;
            tree.validate()?;
        }

        let mut sorted = keys.to_vec();
        sorted.sort_unstable();
        assert_equal(tree.keys().copied(), sorted.iter().copied());
        assert_equal(tree.values().copied(), sorted.iter().map(|k| k + 1));

        tree.drop_in(&alloc);
    }

    assert_allocations(&alloc, keys.len());

    Ok(())
}

#[test]
fn test_insert_never_overwrites() -> TestResult {
    let mut map = RbTreeMap::new();

    let (_, inserted) = map.insert(1, "a")?;
    assert!(inserted);

    let (cursor, inserted) = map.insert(1, "b")?;
    assert!(!inserted);
    assert_eq!(cursor.key_value(), Some((&1, &"a")));

    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&1), Some(&"a"));

    Ok(())
}

#[test]
fn test_allocation_accounting() -> TestResult {
    let alloc = CountingAllocator::default();

    {
        let mut map = RbTreeMap::<u32, u32, NaturalOrder, _>::new_in(&alloc);
        for k in 1..=4 {
            map.insert(k, k * 10)?;
        }
        *map.at_mut(&1)? = 100;
        assert_eq!(alloc.n_allocations(), 4);
        assert_eq!(map.get(&1), Some(&100));

        let mut copy = map.try_clone()?;
        assert_eq!(alloc.n_allocations(), 8);
        assert_eq!(copy, map);

        let moved = copy.take();
        assert_eq!(copy.len(), 0);
        assert!(copy.is_empty());
        assert_eq!(alloc.n_allocations(), 8);
        assert_eq!(moved, map);
        assert_ne!(copy, map);
    }

    assert_allocations(&alloc, 8);

    Ok(())
}

#[test]
fn test_clone_matches_source() -> TestResult {
    let map: RbTreeMap<u32, String> = (0..20).map(|i| (i, i.to_string())).collect();
    let copy = map.clone();

    assert_eq!(copy, map);
    copy.validate()?;
    assert_equal(copy.iter(), map.iter());

    Ok(())
}

#[test]
fn test_reverse_order() -> TestResult {
    let mut map = RbTreeMap::<u32, u32, ReverseOrder>::new_in(Global);
    for k in 1..=5 {
        map.insert(k, k * 10)?;
    }

    assert_equal(map.keys().copied(), vec![5, 4, 3, 2, 1]);
    assert_eq!(map.at(&3)?, &30);
    map.validate()?;

    Ok(())
}

#[test]
fn test_closure_comparator() -> TestResult {
    let mut map = RbTreeMap::with_comparator(|a: &u32, b: &u32| a > b);
    for k in [3, 1, 4, 5, 2] {
        map.insert(k, ())?;
    }

    assert_equal(map.keys().copied(), vec![5, 4, 3, 2, 1]);
    assert!(map.key_comp().less(&2, &1));
    map.validate()?;

    Ok(())
}

#[test]
fn test_equivalent_keys_collapse() -> TestResult {
    // Only the tens digit is compared.
    let mut map = RbTreeMap::with_comparator(|a: &u32, b: &u32| a / 10 < b / 10);
    map.insert(11, "first")?;
    let (cursor, inserted) = map.insert(15, "second")?;
    assert!(!inserted);
    assert_eq!(cursor.key(), Some(&11));

    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&19), Some(&"first"));

    Ok(())
}

#[test]
fn test_lookup() -> TestResult {
    let mut map = RbTreeMap::new();
    map.insert(10, "a")?;
    map.insert(20, "b")?;
    map.insert(30, "c")?;

    assert_eq!(map.find(&20).value(), Some(&"b"));
    assert_eq!(map.find(&99), map.cursor_end());
    assert!(map.find(&99).is_end());
    assert_eq!(map.at(&99), Err(Error::KeyNotFound));
    assert!(map.at_mut(&99).is_err());

    assert!(map.contains_key(&30));
    assert_eq!(map.get_key_value(&30), Some((&30, &"c")));
    if let Some(v) = map.get_mut(&30) {
        *v = "z";
    }
    assert_eq!(map[&30], "z");

    Ok(())
}

#[test]
#[should_panic(expected = "key not found")]
fn test_index_missing_key_panics() {
    let map: RbTreeMap<u32, u32> = RbTreeMap::new();
    assert_eq!(map[&1], 0);
}

#[test]
fn test_get_or_insert_default() -> TestResult {
    let alloc = CountingAllocator::default();
    {
        let mut map = RbTreeMap::<u32, u32, NaturalOrder, _>::new_in(&alloc);

        *map.get_or_insert_default(7)? += 1;
        *map.get_or_insert_default(7)? += 1;
        assert_eq!(map[&7], 2);
        assert_eq!(alloc.n_allocations(), 1);

        map.insert(8, 5)?;
        assert_eq!(*map.get_or_insert_default(8)?, 5);
        assert_eq!(alloc.n_allocations(), 2);
    }
    assert_allocations(&alloc, 2);

    Ok(())
}

#[test]
fn test_entry() -> TestResult {
    let mut map: RbTreeMap<&str, u32> = RbTreeMap::new();

    assert_eq!(*map.entry("a").or_insert(10)?, 10);
    assert_eq!(*map.entry("a").or_insert(20)?, 10);
    assert_eq!(*map.entry("a").and_modify(|v| *v += 1).or_insert(0)?, 11);
    assert_eq!(*map.entry("b").and_modify(|v| *v += 1).or_insert(0)?, 0);
    assert_eq!(*map.entry("c").or_default()?, 0);

    let mut called = false;
    map.entry("a").or_insert_with(|| {
        called = true;
        0
    })?;
    assert!(!called);

    match map.entry("a") {
        Entry::Occupied(mut entry) => {
            assert_eq!(entry.key(), &"a");
            assert_eq!(entry.insert(42), 11);
            assert_eq!(entry.get(), &42);
            assert_eq!(entry.remove_entry(), ("a", 42));
        }
        Entry::Vacant(_) => panic!("expected an occupied entry"),
    }

    match map.entry("d") {
        Entry::Vacant(entry) => {
            assert_eq!(entry.key(), &"d");
            assert_eq!(entry.into_key(), "d");
        }
        Entry::Occupied(_) => panic!("expected a vacant entry"),
    }

    assert_equal(map.keys().copied(), vec!["b", "c"]);
    map.validate()?;

    Ok(())
}

#[test]
fn test_remove() -> TestResult {
    let alloc = CountingAllocator::default();
    {
        let mut map = RbTreeMap::<u32, u32, NaturalOrder, _>::new_in(&alloc);
        map.try_extend((0..32).map(|i| (i, i)))?;

        for i in (0..32).step_by(2) {
            assert_eq!(map.remove(&i), Some(i));
            map.validate()?;
        }
        assert_eq!(map.remove(&0), None);
        assert_eq!(map.remove_entry(&100), None);
        assert_eq!(map.len(), 16);
        assert_equal(map.keys().copied(), (1..32).step_by(2));
        assert_eq!(alloc.n_deallocations(), 16);
    }
    assert_allocations(&alloc, 32);

    Ok(())
}

#[test]
fn test_remove_root_repeatedly() -> TestResult {
    let mut map = RbTreeMap::new();
    map.try_extend((0..100u32).map(|i| (i, ())))?;

    loop {
        let Some(key) = map.structure().next().map(|root| *root.key) else {
            break;
        };
        assert!(map.remove(&key).is_some());
        map.validate()?;
    }
    assert!(map.is_empty());

    Ok(())
}

#[test]
fn test_clear() -> TestResult {
    let alloc = CountingAllocator::default();
    {
        let mut map = RbTreeMap::<u32, u32, NaturalOrder, _>::new_in(&alloc);
        map.try_extend((0..100).map(|i| (i, i)))?;
        map.clear();

        assert!(map.is_empty());
        assert!(map.cursor_front().is_end());
        assert_eq!(alloc.net_allocations(), 0);
        map.validate()?;

        map.insert(1, 1)?;
        assert_equal(map.iter().map(|(k, v)| (*k, *v)), vec![(1, 1)]);
    }
    assert_allocations(&alloc, 101);

    Ok(())
}

#[test]
fn test_clear_with_panicking_drop() -> TestResult {
    let alloc = CountingAllocator::default();
    {
        let mut map = RbTreeMap::<u32, PanicOnDrop, NaturalOrder, _>::new_in(&alloc);
        map.insert(1, PanicOnDrop(true))?;

        let result = panic::catch_unwind(AssertUnwindSafe(|| map.clear()));
        assert!(result.is_err());

        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert!(map.cursor_front().is_end());
        map.validate()?;
        assert_eq!(alloc.n_allocations(), 1);
        assert_eq!(alloc.n_deallocations(), 1);

        map.insert(2, PanicOnDrop(false))?;
        assert_eq!(map.len(), 1);
    }
    assert_eq!(alloc.n_allocations(), 2);
    assert_eq!(alloc.n_deallocations(), 2);

    Ok(())
}

#[test]
fn test_clear_leaks_rest_after_panicking_drop() -> TestResult {
    let alloc = CountingAllocator::default();
    {
        let mut map = RbTreeMap::<u32, PanicOnDrop, NaturalOrder, _>::new_in(&alloc);
        for k in 0..10 {
            map.insert(k, PanicOnDrop(true))?;
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| map.clear()));
        assert!(result.is_err());

        // Only the node being destroyed was freed; the rest are unreachable.
        assert!(map.is_empty());
        assert_eq!(steps_forward(map.cursor_front()), 0);
        map.validate()?;
        assert_eq!(alloc.n_deallocations(), 1);
    }
    assert_eq!(alloc.n_allocations(), 10);
    assert_eq!(alloc.n_deallocations(), 1);

    Ok(())
}

#[test]
fn test_pop() -> TestResult {
    let mut map: RbTreeMap<u32, u32> = (1..=5).map(|i| (i, i * i)).collect();

    assert_eq!(map.pop_first(), Some((1, 1)));
    assert_eq!(map.pop_last(), Some((5, 25)));
    assert_equal(map.keys().copied(), vec![2, 3, 4]);
    map.validate()?;

    Ok(())
}

#[test]
fn test_iterators() -> TestResult {
    let mut map: RbTreeMap<u32, u32> = (1..=6).map(|i| (i, i)).collect();

    let mut iter = map.iter();
    assert_eq!(iter.len(), 6);
    assert_eq!(iter.next(), Some((&1, &1)));
    assert_eq!(iter.next_back(), Some((&6, &6)));
    assert_eq!(iter.len(), 4);
    assert_equal(iter.map(|(k, _)| *k), vec![2, 3, 4, 5]);

    assert_equal(map.keys().rev().copied(), vec![6, 5, 4, 3, 2, 1]);

    for (k, v) in map.iter_mut() {
        *v += k;
    }
    for v in map.values_mut().rev() {
        *v += 1;
    }
    assert_equal(map.values().copied(), vec![3, 5, 7, 9, 11, 13]);

    for (_, v) in &mut map {
        *v = 0;
    }
    assert!((&map).into_iter().all(|(_, v)| *v == 0));

    let mut owned = map.into_iter();
    assert_eq!(owned.len(), 6);
    assert_eq!(owned.next_back(), Some((6, 0)));
    assert_eq!(owned.next(), Some((1, 0)));
    assert_equal(owned.map(|(k, _)| k), vec![2, 3, 4, 5]);

    Ok(())
}

#[test]
fn test_into_iter_partial_drop() -> TestResult {
    let alloc = CountingAllocator::default();
    {
        let mut map = RbTreeMap::<u32, u32, NaturalOrder, _>::new_in(&alloc);
        map.try_extend((0..10).map(|i| (i, i)))?;
        let mut iter = map.into_iter();
        assert_eq!(iter.next(), Some((0, 0)));
        assert_eq!(alloc.n_deallocations(), 1);
    }
    assert_allocations(&alloc, 10);

    Ok(())
}

#[test]
fn test_cursor_navigation() -> TestResult {
    let map: RbTreeMap<u32, u32> = (1..=5).map(|i| (i, i)).collect();

    let mut cursor = map.cursor_end();
    assert!(cursor.is_end());
    cursor.move_prev();
    assert_eq!(cursor.key(), Some(&5));
    cursor.move_next();
    assert!(cursor.is_end());
    cursor.move_next();
    assert_eq!(cursor.key(), Some(&1));

    let front = map.cursor_front();
    assert!(front.peek_prev().is_end());
    assert_eq!(front.peek_next().key(), Some(&2));
    assert_eq!(front.peek_next().peek_prev(), front);
    assert_eq!(map.cursor_back().peek_next(), map.cursor_end());

    let mut walked = Vec::new();
    let mut cursor = map.cursor_front();
    while let Some((k, _)) = cursor.key_value() {
        walked.push(*k);
        cursor.move_next();
    }
    assert_eq!(walked, vec![1, 2, 3, 4, 5]);

    Ok(())
}

#[test]
fn test_cursor_mut() -> TestResult {
    let mut map: RbTreeMap<u32, u32> = (1..=5).map(|i| (i, i)).collect();

    {
        let mut cursor = map.find_mut(&3);
        assert_eq!(cursor.remove_current(), Some((3, 3)));
        assert_eq!(cursor.key(), Some(&4));
        if let Some(v) = cursor.value_mut() {
            *v = 40;
        }
        cursor.move_prev();
        assert_eq!(cursor.key(), Some(&2));
        assert_eq!(cursor.peek_next().key(), Some(&4));
    }
    assert_eq!(map.get(&4), Some(&40));
    map.validate()?;

    {
        let mut cursor = map.cursor_back_mut();
        assert_eq!(cursor.remove_current(), Some((5, 5)));
        assert!(cursor.is_end());
        assert_eq!(cursor.remove_current(), None);
    }

    let mut cursor = map.cursor_front_mut();
    while cursor.remove_current().is_some() {}
    assert!(map.is_empty());
    map.validate()?;

    Ok(())
}

#[test]
fn test_resource_exhausted() -> TestResult {
    let budget = Budgeted::new(3);
    let mut map = RbTreeMap::<u32, u32, NaturalOrder, _>::new_in(&budget);
    map.try_extend((1..=3).map(|i| (i, i)))?;

    let result = map.insert(4, 4).map(|(_, inserted)| inserted);
    assert!(matches!(result, Err(Error::ResourceExhausted(_))));
    assert!(map.get_or_insert_default(5).is_err());
    assert!(map.try_extend([(6, 6)]).is_err());

    assert_eq!(map.len(), 3);
    assert_equal(map.keys().copied(), vec![1, 2, 3]);
    map.validate()?;

    // Existing keys need no allocation.
    let (_, inserted) = map.insert(2, 20)?;
    assert!(!inserted);
    assert_eq!(*map.get_or_insert_default(3)?, 3);

    Ok(())
}

#[test]
fn test_relocate() -> TestResult {
    let first = CountingAllocator::default();
    let second = CountingAllocator::default();
    {
        let mut map = RbTreeMap::<u32, u32, NaturalOrder, _>::new_in(&first);
        map.try_extend((0..10).map(|i| (i, i)))?;

        let map = map.relocate_in(&first)?;
        assert_eq!(first.n_allocations(), 10);
        assert_eq!(first.n_deallocations(), 0);

        let map = map.relocate_in(&second)?;
        assert!(core::ptr::eq(*map.allocator(), &second));
        assert_eq!(first.net_allocations(), 0);
        assert_eq!(second.n_allocations(), 10);
        assert_equal(map.iter().map(|(k, v)| (*k, *v)), (0..10).map(|i| (i, i)));
        map.validate()?;
    }
    assert_allocations(&first, 10);
    assert_allocations(&second, 10);

    Ok(())
}

#[test]
fn test_try_clone_in() -> TestResult {
    let first = CountingAllocator::default();
    let second = CountingAllocator::default();
    {
        let map = RbTreeMap::<u32, u32, NaturalOrder, _>::try_from_iter_in(
            (0..10).map(|i| (i, i * 3)),
            &first,
        )?;

        let copy = map.try_clone_in(&second)?;
        assert_eq!(first.n_allocations(), 10);
        assert_eq!(second.n_allocations(), 10);
        assert_equal(copy.iter(), map.iter());
        assert_ne!(copy, map);
        copy.validate()?;

        let global = map.try_clone_in(Global)?;
        assert_equal(global.iter(), map.iter());
        assert_eq!(first.n_allocations(), 10);

        let budget = Budgeted::new(4);
        let result = map.try_clone_in(&budget).map(|partial| partial.len());
        assert!(matches!(result, Err(Error::ResourceExhausted(_))));

        drop(map);
        assert_eq!(first.net_allocations(), 0);
        assert_eq!(second.n_deallocations(), 0);
        assert_equal(copy.keys().copied(), 0..10);
    }
    assert_allocations(&first, 10);
    assert_allocations(&second, 10);

    Ok(())
}

#[test]
fn test_cursor_walk_counts_nodes() -> TestResult {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new();

    unsafe {
        for k in 0..5 {
            tree.insert_in(&alloc, k, k)?;
        }
    }
    assert_eq!(steps_forward(tree.cursor_front()), 5);
    assert_eq!(steps_backward(tree.cursor_back()), 5);

    // The stored length disagrees with the nodes reachable by a cursor.
    tree.len = 3;
    assert_eq!(steps_forward(tree.cursor_front()), 5);
    assert_eq!(
        tree.validate(),
        Err(Error::InvariantViolation(Violation::LengthMismatch {
            stored: 3,
            counted: 5,
        }))
    );

    tree.len = 5;
    unsafe { tree.drop_in(&alloc) };
    assert_allocations(&alloc, 5);

    Ok(())
}

#[test]
fn test_equality_requires_interchangeable_allocators() -> TestResult {
    let first = CountingAllocator::default();
    let second = CountingAllocator::default();

    let a = RbTreeMap::<u32, u32, NaturalOrder, _>::try_from_iter_in([(1, 1)], &first)?;
    let b = RbTreeMap::<u32, u32, NaturalOrder, _>::try_from_iter_in([(1, 1)], &second)?;
    let c = RbTreeMap::<u32, u32, NaturalOrder, _>::try_from_iter_in([(1, 1)], &first)?;
    let d = RbTreeMap::<u32, u32, NaturalOrder, _>::try_from_iter_in([(1, 2)], &first)?;

    assert_ne!(a, b);
    assert_eq!(a, c);
    assert_ne!(a, d);

    Ok(())
}

#[test]
fn test_swap() -> TestResult {
    let mut a: RbTreeMap<u32, u32> = (0..3).map(|i| (i, i)).collect();
    let mut b: RbTreeMap<u32, u32> = (10..15).map(|i| (i, i)).collect();

    a.swap(&mut b);

    assert_equal(a.keys().copied(), 10..15);
    assert_equal(b.keys().copied(), 0..3);
    a.validate()?;
    b.validate()?;

    Ok(())
}

#[test]
fn test_accessors() {
    let mut map: RbTreeMap<u32, u32> = RbTreeMap::default();
    map.extend([(2, 2), (1, 1)]);

    assert!(map.max_size() > 0);
    assert_eq!(map.key_comp(), &NaturalOrder);
    assert_eq!(format!("{map:?}"), "{1: 1, 2: 2}");
}

#[test]
fn test_structure() -> TestResult {
    let mut map = RbTreeMap::new();
    for k in [1u32, 2, 3] {
        map.insert(k, k * 10)?;
    }

    let nodes: Vec<_> = map.structure().collect();
    assert_eq!(
        nodes,
        vec![
            NodeView {
                id: 0,
                key: &2,
                value: &20,
                color: Color::Black,
                left: Some(1),
                right: Some(2),
            },
            NodeView {
                id: 1,
                key: &1,
                value: &10,
                color: Color::Red,
                left: None,
                right: None,
            },
            NodeView {
                id: 2,
                key: &3,
                value: &30,
                color: Color::Red,
                left: None,
                right: None,
            },
        ]
    );

    assert_eq!(RbTreeMap::<u32, u32>::new().structure().count(), 0);

    Ok(())
}

#[test]
fn test_structure_ids_are_breadth_first() -> TestResult {
    let map: RbTreeMap<u32, ()> = (0..50).map(|i| (i, ())).collect();

    let nodes: Vec<_> = map.structure().collect();
    assert_eq!(nodes.len(), 50);
    for (i, node) in nodes.iter().enumerate() {
        assert_eq!(node.id, i);
        for child in [node.left, node.right].into_iter().flatten() {
            assert!(child > i);
            assert!(child < nodes.len());
        }
    }

    Ok(())
}

#[test]
fn test_validate_detects_corruption() -> TestResult {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new();

    unsafe {
        tree.try_extend_in(&alloc, (0..8).map(|i| (i, i)))?;
        tree.validate()?;

        Link::set_color(tree.header.root, Color::Red);
        assert_eq!(
            tree.validate(),
            Err(Error::InvariantViolation(Violation::RedRoot))
        );
        Link::set_color(tree.header.root, Color::Black);

        tree.len += 1;
        assert_eq!(
            tree.validate(),
            Err(Error::InvariantViolation(Violation::LengthMismatch {
                stored: 9,
                counted: 8,
            }))
        );
        tree.len -= 1;
        tree.validate()?;

        tree.drop_in(&alloc);
    }

    assert_allocations(&alloc, 8);

    Ok(())
}

#[test]
fn test_validate_detects_misordering() -> TestResult {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new();

    unsafe {
        tree.try_extend_in(&alloc, [(1, 1), (2, 2), (3, 3)])?;
        *tree.at_mut(&2)? = 20;

        let root = tree.header.root;
        let (key, _) = Node::<u32, u32>::key_value(root);
        assert_eq!(*key, 2);
        (*Node::<u32, u32>::from_link(root).as_ptr()).key = 0;
        assert_eq!(
            tree.validate(),
            Err(Error::InvariantViolation(Violation::Unordered))
        );

        tree.drop_in(&alloc);
    }

    assert_allocations(&alloc, 3);

    Ok(())
}

#[test]
fn test_raw_entry_and_cursor_in() -> TestResult {
    let alloc = CountingAllocator::default();
    let mut tree = AllocatedRbTreeMap::<u32, u32>::new();

    unsafe {
        *tree.entry_in(&alloc, 5).or_insert(50)? += 1;
        tree.insert_in(&alloc, 6, 60)?;
        tree.insert_in(&alloc, 4, 40)?;
        assert_eq!(tree.get(&5), Some(&51));

        let mut cursor = tree.cursor_front_mut_in(&alloc);
        assert_eq!(cursor.remove_current(), Some((4, 40)));
        assert_eq!(tree.find(&4), tree.cursor_end());

        assert_eq!(tree.remove_entry_in(&alloc, &6), Some((6, 60)));
        assert_eq!(tree.pop_last_in(&alloc), Some((5, 51)));
        assert!(tree.is_empty());

        tree.drop_in(&alloc);
    }

    assert_allocations(&alloc, 3);

    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Insert(u16),
    Remove(u16),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..128u16).prop_map(Op::Insert),
        (0..128u16).prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn test_random_insert_remove(ops in prop::collection::vec(op(), 1..400)) {
        let alloc = CountingAllocator::default();
        let mut map = RbTreeMap::<u16, u32, NaturalOrder, _>::new_in(&alloc);
        let mut model = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k) => {
                    let before = map.len();
                    let fresh = !model.contains_key(&k);
                    let inserted = map.insert(k, u32::from(k)).map(|(_, inserted)| inserted);
                    prop_assert_eq!(inserted, Ok(fresh));
                    if fresh {
                        // Inserting then removing a key restores the size.
                        prop_assert_eq!(map.remove(&k), Some(u32::from(k)));
                        prop_assert_eq!(map.len(), before);
                        map.validate().map_err(|e| TestCaseError::fail(e.to_string()))?;
                        map.insert(k, u32::from(k)).map_err(|e| TestCaseError::fail(e.to_string()))?;
                        model.insert(k, u32::from(k));
                    }
                }
                Op::Remove(k) => {
                    let before = map.len();
                    let removed = map.remove(&k);
                    prop_assert_eq!(removed, model.remove(&k));
                    if removed.is_none() {
                        prop_assert_eq!(map.len(), before);
                    }
                }
            }
            prop_assert_eq!(map.validate(), Ok(()));
            prop_assert_eq!(steps_forward(map.cursor_front()), map.len());
            prop_assert_eq!(steps_backward(map.cursor_back()), map.len());
        }

        prop_assert!(map.keys().eq(model.keys()));
        prop_assert!(map.values().eq(model.values()));
        prop_assert_eq!(alloc.n_allocations() - alloc.n_deallocations(), map.len());

        drop(map);
        prop_assert_eq!(alloc.net_allocations(), 0);
    }
}

proptest! {
    #[test]
    fn test_strings_reverse_order(words in prop::collection::vec(".*", 1..100)) {
        let mut map = RbTreeMap::<String, (), ReverseOrder>::new_in(Global);
        for word in &words {
            map.insert(word.clone(), ()).map_err(|e| TestCaseError::fail(e.to_string()))?;
        }

        let mut expected = words;
        expected.sort_unstable_by(|a, b| b.cmp(a));
        expected.dedup();

        prop_assert_eq!(map.validate(), Ok(()));
        prop_assert!(map.keys().eq(expected.iter()));
    }
}
