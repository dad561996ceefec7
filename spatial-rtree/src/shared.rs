//! Thread-safe handle around an [`RTree`].

use parking_lot::RwLock;
use std::sync::Arc;

use crate::bounding_box::BoundingBox;
use crate::rtree::{RTree, RTreeConfig, RTreeStats, SpatialResult};
use crate::spatial_index::SpatialIndex;

/// A cloneable single-writer/multi-reader R-Tree.
///
/// Inserts take the write lock for their whole duration, so readers never
/// observe a tree in the middle of a split.
///
/// # Example
///
/// ```rust
/// use spatial_rtree::{BoundingBox, SharedRTree, SpatialIndex};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let index = SharedRTree::new(2, 4)?;
/// index.add(&BoundingBox::new(0.0, 0.0, 10.0, 10.0), 1u64)?;
///
/// let reader = index.clone();
/// let hits = std::thread::spawn(move || reader.find_intersecting(&BoundingBox::point(5.0, 5.0)))
///     .join()
///     .unwrap()?;
/// assert_eq!(hits, vec![1]);
/// # Ok(())
/// # }
/// ```
pub struct SharedRTree<T> {
    inner: Arc<RwLock<RTree<T>>>,
}

impl<T> Clone for SharedRTree<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedRTree<T> {
    /// Create a shared tree with the given fanout bounds.
    pub fn new(min_fanout: usize, max_fanout: usize) -> SpatialResult<Self> {
        Ok(Self::from_tree(RTree::new(min_fanout, max_fanout)?))
    }

    pub fn with_config(config: RTreeConfig) -> SpatialResult<Self> {
        Ok(Self::from_tree(RTree::with_config(config)?))
    }

    /// Wrap an already populated tree.
    pub fn from_tree(tree: RTree<T>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    /// Run `f` with shared read access to the tree.
    pub fn read<R>(&self, f: impl FnOnce(&RTree<T>) -> R) -> R {
        f(&*self.inner.read())
    }

    /// Run `f` with exclusive write access to the tree.
    pub fn write<R>(&self, f: impl FnOnce(&mut RTree<T>) -> R) -> R {
        f(&mut *self.inner.write())
    }

    pub fn stats(&self) -> RTreeStats {
        self.inner.read().stats()
    }
}

impl<T> SpatialIndex<T> for SharedRTree<T>
where
    T: Clone + Send + Sync,
{
    fn add(&self, key: &BoundingBox, value: T) -> SpatialResult<()> {
        self.inner.write().insert(*key, value)
    }

    fn contains_box(&self, key: &BoundingBox) -> SpatialResult<bool> {
        self.inner.read().search(key)
    }

    fn find_intersecting(&self, key: &BoundingBox) -> SpatialResult<Vec<T>> {
        let tree = self.inner.read();
        let results = tree.range_query(key)?.map(|e| e.payload().clone()).collect();
        Ok(results)
    }

    fn find_contained(&self, key: &BoundingBox) -> SpatialResult<Vec<T>> {
        let tree = self.inner.read();
        let results = tree
            .find_contained(key)?
            .into_iter()
            .map(|e| e.payload().clone())
            .collect();
        Ok(results)
    }

    fn find_nearest(
        &self,
        center_x: f64,
        center_y: f64,
        k: usize,
        max_distance: Option<f64>,
    ) -> SpatialResult<Vec<(T, f64)>> {
        let tree = self.inner.read();
        let results = tree
            .nearest(center_x, center_y, k, max_distance)?
            .into_iter()
            .map(|(e, d)| (e.payload().clone(), d))
            .collect();
        Ok(results)
    }

    fn size(&self) -> u64 {
        self.inner.read().len()
    }

    fn clear(&self) {
        self.inner.write().clear();
    }
}
