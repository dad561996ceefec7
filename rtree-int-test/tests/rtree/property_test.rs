//! Randomized trials checked against a linear scan.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spatial_rtree::{BoundingBox, SpatialIndex};
use spatial_rtree_int_test::test_util::{
    assert_integrity, cleanup, create_default_test_context, create_test_context,
    insert_random_boxes, random_box, run_test,
};

const EXTENT: f64 = 1000.0;

#[test]
fn test_invariants_after_every_insert() {
    run_test(
        || create_test_context(2, 5),
        |ctx| {
            let mut rng = StdRng::seed_from_u64(7);
            for i in 0..400u64 {
                ctx.insert(random_box(&mut rng, EXTENT), i)?;
                assert_integrity(&ctx);
            }
            assert_eq!(ctx.tree().stats().total_entries, 400);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_window_queries_match_linear_scan() {
    for (m, max) in [(1, 2), (2, 4), (3, 9), (8, 16)] {
        run_test(
            move || create_test_context(m, max),
            |ctx| {
                insert_random_boxes(&ctx, 1500, EXTENT, 42)?;
                assert_integrity(&ctx);

                let mut rng = StdRng::seed_from_u64(99);
                for _ in 0..100 {
                    let query = random_box(&mut rng, EXTENT).union(&random_box(&mut rng, EXTENT));
                    let mut found = ctx.tree().find_intersecting(&query)?;
                    found.sort_unstable();
                    assert_eq!(found, ctx.expected_intersecting(&query));

                    let mut contained = ctx.tree().find_contained(&query)?;
                    contained.sort_unstable();
                    assert_eq!(contained, ctx.expected_contained(&query));
                }
                Ok(())
            },
            |ctx| cleanup(ctx),
        )
    }
}

#[test]
fn test_full_extent_returns_each_entry_once() {
    run_test(
        || create_default_test_context(),
        |ctx| {
            insert_random_boxes(&ctx, 5000, EXTENT, 3)?;

            let everything = BoundingBox::new(0.0, 0.0, EXTENT * 2.0, EXTENT * 2.0);
            let mut all = ctx.tree().find_intersecting(&everything)?;
            all.sort_unstable();
            let expected: Vec<u64> = (0..5000).collect();
            assert_eq!(all, expected);

            let iterated = ctx.tree().read(|tree| tree.iter().count());
            assert_eq!(iterated, 5000);
            assert_integrity(&ctx);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_exact_search_matches_linear_scan() {
    run_test(
        || create_test_context(2, 6),
        |ctx| {
            let mut rng = StdRng::seed_from_u64(11);
            let mut boxes = Vec::new();
            for i in 0..300u64 {
                let bbox = random_box(&mut rng, EXTENT);
                ctx.insert(bbox, i)?;
                boxes.push(bbox);
            }

            for bbox in &boxes {
                assert!(ctx.tree().contains_box(bbox)?);
            }
            for _ in 0..300 {
                let candidate = random_box(&mut rng, EXTENT);
                assert_eq!(ctx.tree().contains_box(&candidate)?, ctx.contains_exact(&candidate));
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_duplicates_are_all_returned() {
    run_test(
        || create_test_context(2, 4),
        |ctx| {
            let spot = BoundingBox::new(10.0, 10.0, 12.0, 12.0);
            for i in 0..25u64 {
                ctx.insert(spot, i)?;
            }
            insert_random_boxes(&ctx, 200, EXTENT, 5)?;
            assert_integrity(&ctx);

            assert!(ctx.tree().contains_box(&spot)?);
            let found = ctx.tree().find_contained(&spot)?;
            assert!(found.len() >= 25);
            for i in 0..25u64 {
                assert!(found.contains(&i));
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_nearest_matches_linear_scan() {
    run_test(
        || create_test_context(3, 8),
        |ctx| {
            insert_random_boxes(&ctx, 800, EXTENT, 21)?;

            let mut rng = StdRng::seed_from_u64(22);
            for _ in 0..50 {
                let x = rng.random_range(-100.0..EXTENT + 100.0);
                let y = rng.random_range(-100.0..EXTENT + 100.0);
                let k = rng.random_range(1..20);

                let distances: Vec<f64> = ctx
                    .tree()
                    .find_nearest(x, y, k, None)?
                    .into_iter()
                    .map(|(_, d)| d)
                    .collect();
                assert_eq!(distances, ctx.expected_nearest_distances(x, y, k));
            }
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_within_distance() {
    run_test(
        || create_test_context(2, 8),
        |ctx| {
            insert_random_boxes(&ctx, 600, EXTENT, 31)?;

            let (x, y, radius) = (500.0, 500.0, 75.0);
            let hits = ctx.tree().find_within_distance(x, y, radius)?;
            let expected = ctx
                .expected_nearest_distances(x, y, usize::MAX)
                .into_iter()
                .filter(|d| *d <= radius)
                .count();

            assert_eq!(hits.len(), expected);
            assert!(hits.iter().all(|(_, d)| *d <= radius));
            assert!(hits.windows(2).all(|w| w[0].1 <= w[1].1));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
