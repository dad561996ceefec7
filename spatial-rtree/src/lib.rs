//! # Spatial R-Tree - In-Memory Spatial Indexing
//!
//! This crate provides an in-memory R-Tree over axis-aligned bounding boxes,
//! built by repeated insertion with Guttman's quadratic split.
//!
//! ## Features
//!
//! - **Dynamic Insertion**: least-enlargement descent, quadratic split, upward adjustment
//! - **Window Queries**: lazy iterator over every entry intersecting a box
//! - **Exact Search**: does an entry with exactly this box exist
//! - **Containment and k-NN Queries**: entries inside a box, nearest entries to a point
//! - **Diagnostics**: level-order dump, statistics and an integrity checker
//! - **Thread Safe Handle**: [`SharedRTree`] for single-writer/multi-reader use
//!
//! ## Quick Start
//!
//! ```rust
//! use spatial_rtree::{BoundingBox, RTree};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut tree = RTree::new(2, 4)?;
//!
//! for (i, (x, y)) in [(1.0, 2.0), (3.0, 4.0), (5.0, 6.0), (12.0, 22.0)].into_iter().enumerate() {
//!     tree.insert_point(x, y, i)?;
//! }
//!
//! assert!(tree.search(&BoundingBox::point(3.0, 4.0))?);
//!
//! let hits: Vec<_> = tree
//!     .range_query(&BoundingBox::new(0.0, 0.0, 6.0, 6.0))?
//!     .map(|entry| *entry.payload())
//!     .collect();
//! assert_eq!(hits.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod bounding_box;
pub mod loader;
pub mod rtree;
pub mod shared;
pub mod spatial_index;

// Re-export R-Tree types
pub use bounding_box::BoundingBox;
pub use loader::{load_points, load_points_from_path};
pub use rtree::{
    IntegrityReport, LeafEntry, LevelOrder, LevelOrderRecord, RTree, RTreeConfig, RTreeStats,
    RangeQuery, SpatialError, SpatialResult, DEFAULT_MAX_FANOUT, DEFAULT_MIN_FANOUT,
};
pub use shared::SharedRTree;
pub use spatial_index::SpatialIndex;
