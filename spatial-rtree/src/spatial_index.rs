//! SpatialIndex trait definition for thread-safe spatial indexing.

use crate::bounding_box::BoundingBox;
use crate::rtree::SpatialResult;

/// A spatial index that can be shared between threads.
///
/// All methods take `&self`; implementations serialize writers internally.
/// Results are returned as owned values so no lock outlives a call.
pub trait SpatialIndex<T>: Send + Sync {
    /// Adds a key to the index.
    fn add(&self, key: &BoundingBox, value: T) -> SpatialResult<()>;

    /// Returns true if some entry has exactly this key.
    fn contains_box(&self, key: &BoundingBox) -> SpatialResult<bool>;

    /// Finds the values whose keys intersect `key`.
    fn find_intersecting(&self, key: &BoundingBox) -> SpatialResult<Vec<T>>;

    /// Finds the values whose keys lie fully inside `key`.
    fn find_contained(&self, key: &BoundingBox) -> SpatialResult<Vec<T>>;

    /// Finds the K nearest values to a point, nearest first.
    fn find_nearest(
        &self,
        center_x: f64,
        center_y: f64,
        k: usize,
        max_distance: Option<f64>,
    ) -> SpatialResult<Vec<(T, f64)>>;

    /// Finds values within a specific distance of a point.
    fn find_within_distance(
        &self,
        center_x: f64,
        center_y: f64,
        distance: f64,
    ) -> SpatialResult<Vec<(T, f64)>> {
        // Default implementation using find_nearest with unbounded k
        self.find_nearest(center_x, center_y, usize::MAX, Some(distance))
    }

    /// Gets the number of entries in the index.
    fn size(&self) -> u64;

    /// Clears all data from the index.
    fn clear(&self);
}
