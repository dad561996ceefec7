use spatial_rtree::{BoundingBox, RTree, SpatialError, SpatialIndex};
use spatial_rtree_int_test::test_util::{
    assert_integrity, cleanup, create_small_test_context, create_test_context,
    insert_sample_points, run_test, SAMPLE_POINTS,
};

#[test]
fn test_sample_points_exact_search() {
    run_test(
        || create_small_test_context(),
        |ctx| {
            insert_sample_points(&ctx)?;
            let tree = ctx.tree();

            assert_eq!(tree.size(), SAMPLE_POINTS.len() as u64);
            assert!(tree.contains_box(&BoundingBox::new(1.0, 2.0, 1.0, 2.0))?);
            assert!(tree.contains_box(&BoundingBox::new(75.0, 9.0, 75.0, 9.0))?);
            assert!(!tree.contains_box(&BoundingBox::new(100.0, 200.0, 100.0, 200.0))?);

            for (x, y) in SAMPLE_POINTS {
                assert!(tree.contains_box(&BoundingBox::point(x, y))?);
            }
            assert_integrity(&ctx);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_window_query_on_grid() {
    run_test(
        || create_test_context(3, 8),
        |ctx| {
            let mut id = 0;
            for x in 0..20 {
                for y in 0..20 {
                    ctx.insert(BoundingBox::point(x as f64, y as f64), id)?;
                    id += 1;
                }
            }

            let window = BoundingBox::new(7.0, 0.0, 9.0, 9.0);
            let found = ctx.tree().read(|tree| -> Result<Vec<(f64, f64)>, SpatialError> {
                let mut points: Vec<(f64, f64)> = tree
                    .range_query(&window)?
                    .map(|e| (e.bbox().min_x, e.bbox().min_y))
                    .collect();
                points.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
                Ok(points)
            })?;

            let mut expected = Vec::new();
            for x in 7..=9 {
                for y in 0..=9 {
                    expected.push((x as f64, y as f64));
                }
            }
            assert_eq!(found, expected);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_first_overflow_splits_root_once() {
    run_test(
        || create_small_test_context(),
        |ctx| {
            let max = ctx.config().max_fanout();
            for i in 0..max as u64 {
                ctx.insert(BoundingBox::point(i as f64, i as f64), i)?;
            }
            assert_eq!(ctx.tree().stats().node_count, 1);
            assert_eq!(ctx.tree().stats().tree_height, 1);

            ctx.insert(BoundingBox::point(100.0, 100.0), max as u64)?;

            let stats = ctx.tree().stats();
            assert_eq!(stats.tree_height, 2);
            assert_eq!(stats.internal_count, 1);
            assert_eq!(stats.leaf_count, 2);

            let root_children = ctx.tree().read(|tree| {
                tree.level_order()
                    .next()
                    .map(|record| (record.is_leaf, record.count))
            });
            assert_eq!(root_children, Some((false, 2)));
            assert_integrity(&ctx);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_fanout_validation() {
    assert!(RTree::<u64>::new(3, 6).is_ok());
    assert!(matches!(RTree::<u64>::new(3, 5), Err(SpatialError::Config(_))));
    assert!(matches!(RTree::<u64>::new(3, 4), Err(SpatialError::Config(_))));
    assert!(matches!(RTree::<u64>::new(0, 4), Err(SpatialError::Config(_))));
    assert!(RTree::<u64>::new(1, 2).is_ok());
}

#[test]
fn test_minimal_fanout_tree() {
    run_test(
        || create_test_context(1, 2),
        |ctx| {
            for i in 0..64u64 {
                ctx.insert(BoundingBox::point((i % 8) as f64, (i / 8) as f64), i)?;
                assert_integrity(&ctx);
            }
            let all = ctx.tree().find_intersecting(&BoundingBox::new(-1.0, -1.0, 8.0, 8.0))?;
            assert_eq!(all.len(), 64);
            assert!(ctx.tree().stats().tree_height >= 6);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_malformed_boxes_rejected() {
    run_test(
        || create_small_test_context(),
        |ctx| {
            insert_sample_points(&ctx)?;
            let tree = ctx.tree();
            let before = tree.stats();

            let inverted = BoundingBox::new(5.0, 5.0, 4.0, 6.0);
            assert!(matches!(tree.add(&inverted, 99), Err(SpatialError::Geometry(_))));
            let nan = BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0);
            assert!(matches!(tree.add(&nan, 99), Err(SpatialError::Geometry(_))));
            let unbounded = BoundingBox::new(f64::NEG_INFINITY, 0.0, f64::INFINITY, 0.0);
            assert!(matches!(tree.add(&unbounded, 99), Err(SpatialError::Geometry(_))));

            assert!(matches!(tree.find_intersecting(&inverted), Err(SpatialError::Geometry(_))));
            assert!(matches!(tree.contains_box(&nan), Err(SpatialError::Geometry(_))));

            assert_eq!(tree.stats(), before);
            assert_integrity(&ctx);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_level_order_dump() {
    run_test(
        || create_small_test_context(),
        |ctx| {
            insert_sample_points(&ctx)?;

            let (lines, depths, leaf_entries) = ctx.tree().read(|tree| {
                let mut lines = Vec::new();
                let mut depths = Vec::new();
                let mut leaf_entries = 0;
                for record in tree.level_order() {
                    lines.push(record.to_string());
                    depths.push((record.depth, record.is_leaf));
                    if record.is_leaf {
                        leaf_entries += record.entries.len();
                    }
                }
                (lines, depths, leaf_entries)
            });

            assert!(lines[0].starts_with("[0] internal"));
            assert_eq!(leaf_entries, SAMPLE_POINTS.len());

            // breadth-first: depths never decrease
            assert!(depths.windows(2).all(|w| w[0].0 <= w[1].0));

            // all leaves share the deepest level
            let deepest = depths.iter().map(|(d, _)| *d).max().unwrap_or(0);
            assert!(depths.iter().all(|(d, leaf)| *leaf == (*d == deepest)));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_empty_tree_queries() {
    run_test(
        || create_small_test_context(),
        |ctx| {
            let tree = ctx.tree();
            assert!(!tree.contains_box(&BoundingBox::point(0.0, 0.0))?);
            assert!(tree.find_intersecting(&BoundingBox::new(-1e9, -1e9, 1e9, 1e9))?.is_empty());
            assert!(tree.find_nearest(0.0, 0.0, 5, None)?.is_empty());

            let records: Vec<String> =
                tree.read(|t| t.level_order().map(|r| r.to_string()).collect());
            assert_eq!(records, vec!["[0] leaf <empty> count=0".to_string()]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
