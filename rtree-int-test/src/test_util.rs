use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spatial_rtree::{BoundingBox, RTreeConfig, SharedRTree, SpatialIndex, SpatialResult};
use std::backtrace::Backtrace;
use std::panic::{RefUnwindSafe, UnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// Points used throughout the scenario tests.
pub const SAMPLE_POINTS: [(f64, f64); 12] = [
    (1.0, 2.0),
    (3.0, 4.0),
    (5.0, 6.0),
    (12.0, 22.0),
    (32.0, 42.0),
    (52.0, 62.0),
    (11.0, 1.0),
    (3.0, 1.0),
    (5.0, 1.0),
    (17.0, 9.0),
    (73.0, 9.0),
    (75.0, 9.0),
];

/// Runs a test between a setup and a teardown step.
///
/// `after` runs even when `test` returns an error. Panics inside any step are
/// caught and reported with the elapsed time before the test is failed.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> SpatialResult<()> + UnwindSafe + RefUnwindSafe,
    B: Fn() -> SpatialResult<TestContext> + UnwindSafe + RefUnwindSafe,
    A: Fn(TestContext) -> SpatialResult<()> + UnwindSafe + RefUnwindSafe,
{
    let start_time = Instant::now();

    let result = std::panic::catch_unwind(|| {
        let backtrace = Backtrace::capture();
        match before() {
            Ok(ctx) => match test(ctx.clone()) {
                Ok(_) => match after(ctx) {
                    Ok(_) => Ok(()),
                    Err(e) => Err((format!("After run failed: {:?}", e), backtrace.to_string())),
                },
                Err(e) => {
                    let _ = after(ctx);
                    Err((format!("Test failed: {:?}", e), backtrace.to_string()))
                }
            },
            Err(e) => Err((format!("Before run failed: {:?}", e), backtrace.to_string())),
        }
    });

    let elapsed = start_time.elapsed();

    let (error, backtrace) = match result {
        Ok(Ok(_)) => return,
        Ok(Err((e, bt))) => (e, bt),
        Err(panic_err) => {
            let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", panic_err.type_id())
            };
            (format!("Panic: {}", err_msg), Backtrace::capture().to_string())
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {:?}", elapsed);
    eprintln!("Error: {}", error);
    if !backtrace.is_empty() && !backtrace.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", backtrace);
    }
    eprintln!("=====================================================\n");

    panic!("Test failed: {}", error);
}

/// A shared tree plus a flat record of everything inserted into it.
///
/// The record is the brute-force oracle queries are checked against.
#[derive(Clone)]
pub struct TestContext {
    tree: SharedRTree<u64>,
    config: RTreeConfig,
    inserted: Arc<RwLock<Vec<(BoundingBox, u64)>>>,
}

impl TestContext {
    pub fn new(config: RTreeConfig) -> SpatialResult<Self> {
        Ok(Self {
            tree: SharedRTree::with_config(config)?,
            config,
            inserted: Arc::new(RwLock::new(Vec::new())),
        })
    }

    pub fn tree(&self) -> SharedRTree<u64> {
        self.tree.clone()
    }

    pub fn config(&self) -> RTreeConfig {
        self.config
    }

    /// Inserts into the tree and, on success, into the oracle.
    pub fn insert(&self, bbox: BoundingBox, id: u64) -> SpatialResult<()> {
        self.tree.add(&bbox, id)?;
        self.inserted.write().push((bbox, id));
        Ok(())
    }

    pub fn inserted_count(&self) -> usize {
        self.inserted.read().len()
    }

    /// Ids whose boxes intersect `query`, by linear scan, sorted.
    pub fn expected_intersecting(&self, query: &BoundingBox) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .inserted
            .read()
            .iter()
            .filter(|(bbox, _)| bbox.intersects(query))
            .map(|(_, id)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Ids whose boxes lie inside `query`, by linear scan, sorted.
    pub fn expected_contained(&self, query: &BoundingBox) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .inserted
            .read()
            .iter()
            .filter(|(bbox, _)| query.contains(bbox))
            .map(|(_, id)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Sorted distances of the `k` closest boxes to a point, by linear scan.
    pub fn expected_nearest_distances(&self, x: f64, y: f64, k: usize) -> Vec<f64> {
        let mut distances: Vec<f64> = self
            .inserted
            .read()
            .iter()
            .map(|(bbox, _)| bbox.distance_to_point(x, y))
            .collect();
        distances.sort_by(|a, b| a.total_cmp(b));
        distances.truncate(k);
        distances
    }

    pub fn contains_exact(&self, target: &BoundingBox) -> bool {
        self.inserted.read().iter().any(|(bbox, _)| bbox == target)
    }
}

pub fn create_test_context(min_fanout: usize, max_fanout: usize) -> SpatialResult<TestContext> {
    let config = RTreeConfig::new()
        .with_min_fanout(min_fanout)
        .with_max_fanout(max_fanout);
    TestContext::new(config)
}

pub fn create_small_test_context() -> SpatialResult<TestContext> {
    create_test_context(2, 4)
}

pub fn create_default_test_context() -> SpatialResult<TestContext> {
    TestContext::new(RTreeConfig::default())
}

/// Inserts [`SAMPLE_POINTS`] with payloads `0..12`.
pub fn insert_sample_points(ctx: &TestContext) -> SpatialResult<()> {
    for (i, (x, y)) in SAMPLE_POINTS.iter().enumerate() {
        ctx.insert(BoundingBox::point(*x, *y), i as u64)?;
    }
    Ok(())
}

/// Inserts `count` random boxes inside `[0, extent]^2`, ids continuing from
/// what the context already holds.
pub fn insert_random_boxes(
    ctx: &TestContext,
    count: usize,
    extent: f64,
    seed: u64,
) -> SpatialResult<()> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = ctx.inserted_count() as u64;
    for i in 0..count as u64 {
        ctx.insert(random_box(&mut rng, extent), start + i)?;
    }
    Ok(())
}

/// A random box inside `[0, extent]^2`; about a quarter of them are points.
pub fn random_box(rng: &mut StdRng, extent: f64) -> BoundingBox {
    let x = rng.random_range(0.0..extent);
    let y = rng.random_range(0.0..extent);
    if rng.random_bool(0.25) {
        return BoundingBox::point(x, y);
    }
    let w = rng.random_range(0.0..extent / 20.0);
    let h = rng.random_range(0.0..extent / 20.0);
    BoundingBox::new(x, y, x + w, y + h)
}

/// Panics with every violation if the tree is structurally broken.
pub fn assert_integrity(ctx: &TestContext) {
    let report = ctx.tree().read(|tree| tree.check_integrity());
    assert!(report.is_valid, "integrity violations: {:?}", report.errors);
}

pub fn cleanup(ctx: TestContext) -> SpatialResult<()> {
    ctx.tree().clear();
    ctx.inserted.write().clear();
    Ok(())
}
