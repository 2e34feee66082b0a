//! Demonstrates the ergonomic wrapper type for red-black trees.
//!
//! This example shows how to use the safe wrapper type (`RbTreeMap`) instead
//! of the lower-level allocated type.

use allocated_rbtree::{Entry, RbTreeMap};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Red-Black Tree Demo ===\n");
    ordered_demo()?;

    println!("\n=== Custom Comparator Demo ===\n");
    comparator_demo()?;

    Ok(())
}

fn ordered_demo() -> Result<(), Box<dyn std::error::Error>> {
    // Create a new tree using the ergonomic wrapper
    let mut map = RbTreeMap::new();

    // Insert some key-value pairs (no unsafe blocks needed!)
    map.insert(3, "three")?;
    map.insert(1, "one")?;
    map.insert(4, "four")?;
    let (_, inserted) = map.insert(1, "ONE")?; // Existing keys are kept
    map.insert(5, "five")?;
    map.insert(9, "nine")?;
    map.insert(2, "two")?;

    println!("Inserted {} items (second insert of 1: {})", map.len(), inserted);

    // Query the map
    if let Some(value) = map.get(&1) {
        println!("Key 1: {}", value);
    }
    match map.at(&7) {
        Ok(value) => println!("Key 7: {}", value),
        Err(err) => println!("Key 7: {}", err),
    }

    // Iterate over entries (sorted by key)
    println!("\nAll entries:");
    for (k, v) in &map {
        println!("  {} -> {}", k, v);
    }

    // Use the entry API for in-place manipulation
    if let Entry::Vacant(entry) = map.entry(6) {
        entry.insert("six")?;
    }

    println!("\nAfter adding 6: {} items", map.len());

    // Walk backwards from past the end with a cursor
    let mut cursor = map.cursor_end();
    cursor.move_prev();
    print!("\nDescending:");
    while let Some((k, _)) = cursor.key_value() {
        print!(" {}", k);
        cursor.move_prev();
    }
    println!();

    // Remove the smallest entry
    if let Some((k, v)) = map.pop_first() {
        println!("\nRemoved first entry: {} -> {}", k, v);
    }

    println!("Final count: {} items", map.len());
    map.validate()?;

    Ok(())
}

fn comparator_demo() -> Result<(), Box<dyn std::error::Error>> {
    // Order strings by length, so words of equal length collapse into one key
    let mut map = RbTreeMap::with_comparator(|a: &&str, b: &&str| a.len() < b.len());

    for word in ["pear", "fig", "banana", "kiwi", "apple"] {
        let (_, inserted) = map.insert(word, word.len())?;
        if !inserted {
            println!("{} has the same length as an existing key", word);
        }
    }

    print!("\nKeys: ");
    for k in map.keys() {
        print!("{} ", k);
    }
    println!();

    // Count how often each length was seen
    let mut counts: RbTreeMap<usize, u32> = RbTreeMap::new();
    for word in ["a", "bb", "cc", "ddd"] {
        *counts.get_or_insert_default(word.len())? += 1;
    }
    println!("Length counts: {:?}", counts);

    // Clear all entries
    map.clear();
    println!("\nAfter clear: {} items", map.len());

    Ok(())
}
