//! In-memory R-Tree implementation.
//!
//! This module provides a Guttman-style R-Tree with:
//! - Arena-backed node storage addressed by stable [`NodeId`] indices
//! - Least-enlargement subtree selection and quadratic node splitting
//! - Upward MBR and split propagation through parent back-references
//! - Exact, window, containment and nearest-neighbour queries
//! - Breadth-first diagnostics and an invariant checker

pub mod rtree_types;
pub mod rtree_constants;
pub mod rtree_config;
pub mod split;
pub mod traversal;
mod rtree_impl;

pub use rtree_types::{
    SpatialError, SpatialResult, RTreeStats, IntegrityReport, LevelOrderRecord,
    Node, NodeId, LeafEntry, ChildRef,
};
pub use rtree_constants::{DEFAULT_MIN_FANOUT, DEFAULT_MAX_FANOUT};
pub use rtree_config::RTreeConfig;
pub use traversal::{LevelOrder, RangeQuery};
pub use rtree_impl::RTree;
