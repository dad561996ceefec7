use spatial_rtree::{BoundingBox, SpatialIndex};
use spatial_rtree_int_test::test_util::{
    assert_integrity, cleanup, create_test_context, insert_random_boxes, run_test,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_readers_see_consistent_tree_during_writes() {
    run_test(
        || create_test_context(2, 6),
        |ctx| {
            insert_random_boxes(&ctx, 500, 1000.0, 1)?;
            let done = Arc::new(AtomicBool::new(false));

            let writer = {
                let ctx = ctx.clone();
                let done = done.clone();
                thread::spawn(move || {
                    let result = insert_random_boxes(&ctx, 2000, 1000.0, 2);
                    done.store(true, Ordering::SeqCst);
                    result
                })
            };

            let readers: Vec<_> = (0..4)
                .map(|_| {
                    let tree = ctx.tree();
                    let done = done.clone();
                    thread::spawn(move || {
                        let mut last_size = 0;
                        while !done.load(Ordering::SeqCst) {
                            let (size, valid) =
                                tree.read(|t| (t.len(), t.check_integrity().is_valid));
                            assert!(valid);
                            assert!(size >= last_size);
                            last_size = size;
                        }
                    })
                })
                .collect();

            writer.join().expect("writer panicked")?;
            for reader in readers {
                reader.join().expect("reader panicked");
            }

            assert_eq!(ctx.tree().size(), 2500);
            assert_integrity(&ctx);

            let query = BoundingBox::new(200.0, 200.0, 400.0, 400.0);
            let mut found = ctx.tree().find_intersecting(&query)?;
            found.sort_unstable();
            assert_eq!(found, ctx.expected_intersecting(&query));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_parallel_writers_serialize() {
    run_test(
        || create_test_context(4, 12),
        |ctx| {
            let tree = ctx.tree();
            let writers: Vec<_> = (0..4u64)
                .map(|w| {
                    let tree = tree.clone();
                    thread::spawn(move || {
                        for i in 0..250u64 {
                            let id = w * 1000 + i;
                            let bbox = BoundingBox::point(i as f64, w as f64);
                            tree.add(&bbox, id)?;
                        }
                        Ok::<(), spatial_rtree::SpatialError>(())
                    })
                })
                .collect();

            for writer in writers {
                writer.join().expect("writer panicked")?;
            }

            assert_eq!(tree.size(), 1000);
            assert!(tree.read(|t| t.check_integrity().is_valid));

            let row = tree.find_intersecting(&BoundingBox::new(0.0, 2.0, 1000.0, 2.0))?;
            assert_eq!(row.len(), 250);
            assert!(row.iter().all(|id| (2000..2250).contains(id)));

            tree.clear();
            assert_eq!(tree.size(), 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
