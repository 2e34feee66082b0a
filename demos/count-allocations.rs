use rand::Rng;

use allocated::{CountingAllocator, DropIn};

use allocated_rbtree::{AllocatedRbTreeMap, Error};

fn main() -> Result<(), Error> {
    for i in 0..100 {
        let alloc = CountingAllocator::default();
        let mut tree = AllocatedRbTreeMap::<u32, u32>::new();

        let mut rng = rand::thread_rng();

        for _ in 0..1000 {
            let k: u32 = rng.gen_range(0..2000);
            let v: u32 = rng.gen();

            if rng.gen_bool(0.25) {
                unsafe {
                    tree.remove_entry_in(&alloc, &k);
                }
            } else {
                unsafe {
                    tree.insert_in(&alloc, k, v)?;
                }
            }

            println!(
                "{},{},{},{},{}",
                i,
                tree.len(),
                alloc.n_allocations(),
                alloc.n_deallocations(),
                alloc.n_bytes_allocated()
            );
        }

        tree.validate()?;
        assert_eq!(
            alloc.n_allocations() - alloc.n_deallocations(),
            tree.len()
        );

        unsafe { tree.drop_in(&alloc) };

        assert_eq!(alloc.net_allocations(), 0);
    }

    Ok(())
}
