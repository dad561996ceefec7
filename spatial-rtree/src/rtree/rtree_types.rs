//! Core types and data structures for the in-memory R-Tree.
//!
//! This module defines the fundamental types used throughout the R-Tree:
//! - Error types and result types
//! - Node types (Leaf and Internal) and their arena slots
//! - Statistics, integrity and level-order diagnostic records

use crate::bounding_box::{union_all, BoundingBox};
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur in spatial indexing operations
#[derive(Debug, Error)]
pub enum SpatialError {
    /// A malformed box (`min > max` on some axis, NaN or infinite) was passed to the tree.
    #[error("Invalid geometry: {0}")]
    Geometry(String),

    /// An invalid `(min_fanout, max_fanout)` pair was supplied at construction.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SpatialError {
    pub(crate) fn malformed_box(bbox: &BoundingBox) -> Self {
        SpatialError::Geometry(format!(
            "{} is malformed (expected finite coordinates with min_x <= max_x and min_y <= max_y)",
            bbox
        ))
    }
}

/// Result type for spatial operations
pub type SpatialResult<T> = Result<T, SpatialError>;

/// Node ID - stable index of a node in the tree's arena
pub type NodeId = usize;

// ============================================================================
// Statistics
// ============================================================================

/// Structural statistics about an R-Tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTreeStats {
    pub total_entries: u64,
    pub node_count: u64,
    pub leaf_count: u64,
    pub internal_count: u64,
    pub tree_height: u32,
}

/// Result of checking the structural invariants of a tree
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    /// Total nodes reachable from the root
    pub nodes_checked: u64,
    /// Summary of findings
    pub is_valid: bool,
    /// Detailed error messages
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn new() -> Self {
        Self {
            nodes_checked: 0,
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.is_valid = false;
        self.errors.push(message);
    }
}

impl Default for IntegrityReport {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Node Types
// ============================================================================

/// An entry in a leaf node: a box plus an opaque payload.
///
/// Entries are immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafEntry<T> {
    bbox: BoundingBox,
    payload: T,
}

impl<T> LeafEntry<T> {
    pub(crate) fn new(bbox: BoundingBox, payload: T) -> Self {
        Self { bbox, payload }
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn into_parts(self) -> (BoundingBox, T) {
        (self.bbox, self.payload)
    }
}

/// A child reference in an internal node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChildRef {
    pub bbox: BoundingBox,
    pub node: NodeId,
}

/// Anything a node holds: leaf entries or child references.
pub trait Bounded {
    fn bbox(&self) -> &BoundingBox;
}

impl<T> Bounded for LeafEntry<T> {
    fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

impl Bounded for ChildRef {
    fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

/// Node types in the R-Tree
#[derive(Debug, Clone)]
pub enum Node<T> {
    /// Leaf node containing actual entries
    Leaf { entries: Vec<LeafEntry<T>> },
    /// Internal node containing child references
    Internal { children: Vec<ChildRef> },
}

impl<T> Node<T> {
    /// Get the bounding box enclosing all children/entries
    pub fn compute_bbox(&self) -> BoundingBox {
        match self {
            Node::Leaf { entries } => union_all(entries.iter().map(|e| &e.bbox)),
            Node::Internal { children } => union_all(children.iter().map(|c| &c.bbox)),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    pub fn len(&self) -> usize {
        match self {
            Node::Leaf { entries } => entries.len(),
            Node::Internal { children } => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A node together with its MBR and parent back-reference.
///
/// `parent` never implies ownership; the tree's arena owns every slot.
#[derive(Debug, Clone)]
pub(crate) struct NodeSlot<T> {
    pub node: Node<T>,
    pub mbr: BoundingBox,
    pub parent: Option<NodeId>,
}

impl<T> NodeSlot<T> {
    pub fn new(node: Node<T>, parent: Option<NodeId>) -> Self {
        let mbr = node.compute_bbox();
        Self { node, mbr, parent }
    }

    pub fn empty_leaf() -> Self {
        Self {
            node: Node::Leaf { entries: Vec::new() },
            mbr: BoundingBox::empty(),
            parent: None,
        }
    }
}

// ============================================================================
// Level-order diagnostics
// ============================================================================

/// One node as seen by a breadth-first walk of the tree.
#[derive(Debug, Clone)]
pub struct LevelOrderRecord<'a, T> {
    /// Distance from the root (the root is at depth 0)
    pub depth: usize,
    /// Node MBR, `None` only for the empty root leaf
    pub mbr: Option<BoundingBox>,
    pub is_leaf: bool,
    /// Number of entries (leaf) or children (internal)
    pub count: usize,
    /// Leaf entries; empty for internal nodes
    pub entries: &'a [LeafEntry<T>],
}

impl<T> std::fmt::Display for LevelOrderRecord<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_leaf { "leaf" } else { "internal" };
        match &self.mbr {
            Some(mbr) => write!(f, "[{}] {} {} count={}", self.depth, kind, mbr, self.count),
            None => write!(f, "[{}] {} <empty> count={}", self.depth, kind, self.count),
        }
    }
}
