//! RTree implementation.

use crate::bounding_box::{union_all, BoundingBox};

use super::rtree_config::RTreeConfig;
use super::rtree_constants::ROOT_SPLIT_CHILDREN;
use super::rtree_types::{
    SpatialError, SpatialResult, RTreeStats, IntegrityReport, Node, NodeId, NodeSlot, LeafEntry,
    ChildRef,
};
use super::split::quadratic_split;
use super::traversal::{LevelOrder, RangeQuery};

/// An in-memory R-Tree over axis-aligned bounding boxes.
///
/// Nodes live in an arena owned by the tree and refer to each other by
/// [`NodeId`]. Each node keeps a non-owning parent index that insertion uses
/// to walk back up after a leaf changes.
///
/// The tree is not internally synchronized: [`RTree::insert`] takes
/// `&mut self` and every query takes `&self`. Use
/// [`SharedRTree`](crate::SharedRTree) for a single-writer/multi-reader handle.
///
/// # Example
///
/// ```rust
/// use spatial_rtree::{BoundingBox, RTree};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut tree = RTree::new(2, 4)?;
/// tree.insert_point(1.0, 2.0, "a")?;
/// tree.insert(BoundingBox::new(5.0, 5.0, 8.0, 9.0), "b")?;
///
/// assert!(tree.search(&BoundingBox::point(1.0, 2.0))?);
/// let hits: Vec<_> = tree.range_query(&BoundingBox::new(0.0, 0.0, 6.0, 6.0))?
///     .map(|e| *e.payload())
///     .collect();
/// assert_eq!(hits.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RTree<T> {
    nodes: Vec<NodeSlot<T>>,
    root: NodeId,
    config: RTreeConfig,
    /// Number of levels; a lone root leaf has height 1
    height: u32,
    size: u64,
}

impl<T> RTree<T> {
    /// Create an empty tree with the given minimum and maximum fanout.
    ///
    /// Fails with [`SpatialError::Config`] unless `min_fanout >= 1` and
    /// `max_fanout >= 2 * min_fanout`.
    pub fn new(min_fanout: usize, max_fanout: usize) -> SpatialResult<Self> {
        Self::with_config(
            RTreeConfig::new()
                .with_min_fanout(min_fanout)
                .with_max_fanout(max_fanout),
        )
    }

    /// Create an empty tree from a configuration.
    pub fn with_config(config: RTreeConfig) -> SpatialResult<Self> {
        config.validate()?;
        log::debug!(
            "Creating R-Tree with min_fanout={} max_fanout={}",
            config.min_fanout(),
            config.max_fanout()
        );
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: RTreeConfig) -> Self {
        Self {
            nodes: vec![NodeSlot::empty_leaf()],
            root: 0,
            config,
            height: 1,
            size: 0,
        }
    }

    pub fn config(&self) -> &RTreeConfig {
        &self.config
    }

    /// Number of entries in the tree.
    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of levels, counting the leaf level.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// MBR of the whole tree, `None` while it is empty.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let mbr = self.nodes[self.root].mbr;
        if mbr.is_empty() {
            None
        } else {
            Some(mbr)
        }
    }

    /// Insert one entry.
    ///
    /// A malformed box is rejected with [`SpatialError::Geometry`] before the
    /// tree is touched. Otherwise the entry is placed in the leaf needing the
    /// least enlargement, overflowing nodes are split bottom-up and the tree
    /// grows by one level when the root itself splits.
    pub fn insert(&mut self, bbox: BoundingBox, payload: T) -> SpatialResult<()> {
        check_box(&bbox)?;

        let leaf_id = self.choose_subtree(self.root, &bbox);
        let slot = &mut self.nodes[leaf_id];
        match &mut slot.node {
            Node::Leaf { entries } => entries.push(LeafEntry::new(bbox, payload)),
            Node::Internal { .. } => {
                unreachable!("choose_subtree stopped at internal node {}", leaf_id)
            }
        }
        slot.mbr.expand(&bbox);

        let sibling = if slot.node.len() > self.config.max_fanout() {
            Some(self.split_node(leaf_id))
        } else {
            None
        };
        self.adjust_tree(leaf_id, sibling);

        self.size += 1;
        Ok(())
    }

    /// Insert a point as a degenerate box.
    pub fn insert_point(&mut self, x: f64, y: f64, payload: T) -> SpatialResult<()> {
        self.insert(BoundingBox::point(x, y), payload)
    }

    /// Returns true if at least one entry has exactly the box `target`.
    pub fn search(&self, target: &BoundingBox) -> SpatialResult<bool> {
        check_box(target)?;
        Ok(self.search_recursive(self.root, target))
    }

    /// Lazily yields every entry whose box intersects `query`.
    ///
    /// Result order is unspecified.
    pub fn range_query(&self, query: &BoundingBox) -> SpatialResult<RangeQuery<'_, T>> {
        check_box(query)?;
        Ok(RangeQuery::new(&self.nodes, self.root, Some(*query)))
    }

    /// Iterates over every entry in the tree.
    pub fn iter(&self) -> RangeQuery<'_, T> {
        RangeQuery::new(&self.nodes, self.root, None)
    }

    /// Entries whose box lies entirely inside `query`.
    pub fn find_contained(&self, query: &BoundingBox) -> SpatialResult<Vec<&LeafEntry<T>>> {
        check_box(query)?;
        let mut results = Vec::new();
        self.contained_recursive(self.root, query, &mut results);
        Ok(results)
    }

    /// Find the K nearest entries to a point.
    ///
    /// Distance is measured from the point to the nearest edge of each entry's
    /// box (0 when inside). Children are visited nearest first and branches
    /// farther than the current K-th candidate are pruned.
    ///
    /// # Returns
    /// Up to `k` (entry, distance) pairs sorted by distance, nearest first
    pub fn nearest(
        &self,
        x: f64,
        y: f64,
        k: usize,
        max_distance: Option<f64>,
    ) -> SpatialResult<Vec<(&LeafEntry<T>, f64)>> {
        if x.is_nan() || y.is_nan() {
            return Err(SpatialError::Geometry(format!(
                "query point ({}, {}) has a NaN coordinate",
                x, y
            )));
        }
        if let Some(d) = max_distance {
            if d.is_nan() || d < 0.0 {
                return Err(SpatialError::Geometry(format!(
                    "max_distance must be a non-negative number, got {}",
                    d
                )));
            }
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        let mut max_dist = max_distance.unwrap_or(f64::INFINITY);
        self.nearest_recursive(self.root, x, y, k, &mut results, &mut max_dist);

        results.sort_by(|a, b| a.1.total_cmp(&b.1));
        results.truncate(k);
        Ok(results)
    }

    /// Breadth-first enumeration of every node, root first.
    pub fn level_order(&self) -> LevelOrder<'_, T> {
        LevelOrder::new(&self.nodes, self.root)
    }

    /// Structural statistics.
    pub fn stats(&self) -> RTreeStats {
        let mut stats = RTreeStats {
            total_entries: self.size,
            tree_height: self.height,
            ..RTreeStats::default()
        };
        for record in self.level_order() {
            stats.node_count += 1;
            if record.is_leaf {
                stats.leaf_count += 1;
            } else {
                stats.internal_count += 1;
            }
        }
        stats
    }

    /// Check every structural invariant of the tree
    ///
    /// This method verifies that:
    /// - every MBR is exactly the union of what the node holds
    /// - every child reference carries its child's current MBR
    /// - node fill stays within `[min_fanout, max_fanout]` (root excepted)
    /// - all leaves sit at the same depth
    /// - parent links agree with child lists and no node is orphaned
    pub fn check_integrity(&self) -> IntegrityReport {
        let mut report = IntegrityReport::new();
        let mut leaf_depth = None;
        let mut entries = 0u64;

        if self.nodes[self.root].parent.is_some() {
            report.fail(format!("Root {} has a parent", self.root));
        }
        self.integrity_recursive(
            self.root,
            None,
            0,
            &mut leaf_depth,
            &mut entries,
            &mut report,
        );

        if let Some(depth) = leaf_depth {
            if depth + 1 != self.height as usize {
                report.fail(format!(
                    "Leaves at depth {} but recorded height is {}",
                    depth, self.height
                ));
            }
        }
        if entries != self.size {
            report.fail(format!(
                "Found {} entries but recorded size is {}",
                entries, self.size
            ));
        }
        if report.nodes_checked != self.nodes.len() as u64 {
            report.fail(format!(
                "{} nodes reachable from root but arena holds {}",
                report.nodes_checked,
                self.nodes.len()
            ));
        }

        report
    }

    /// Removes every entry, leaving a single empty root leaf.
    pub fn clear(&mut self) {
        log::debug!("Clearing R-Tree with {} entries", self.size);
        self.nodes = vec![NodeSlot::empty_leaf()];
        self.root = 0;
        self.height = 1;
        self.size = 0;
    }

    /// Descend to the leaf needing least enlargement to absorb `bbox`.
    fn choose_subtree(&self, node_id: NodeId, bbox: &BoundingBox) -> NodeId {
        match &self.nodes[node_id].node {
            Node::Leaf { .. } => node_id,
            Node::Internal { children } => {
                let best = best_child(children, bbox);
                self.choose_subtree(children[best].node, bbox)
            }
        }
    }

    /// Split an overflowing node in place.
    ///
    /// The node keeps the first group; a new node holding the second group is
    /// appended to the arena and its id returned. The new node starts with the
    /// same parent and is linked into that parent by `adjust_tree`.
    fn split_node(&mut self, node_id: NodeId) -> NodeId {
        let min_fill = self.config.min_fanout();
        let sibling_id = self.nodes.len();
        let parent = self.nodes[node_id].parent;

        let node = std::mem::replace(
            &mut self.nodes[node_id].node,
            Node::Leaf { entries: Vec::new() },
        );

        let ((kept, kept_mbr), (moved, moved_mbr)) = match node {
            Node::Leaf { entries } => {
                let (first, second) = quadratic_split(entries, min_fill);
                (
                    (Node::Leaf { entries: first.items }, first.mbr),
                    (Node::Leaf { entries: second.items }, second.mbr),
                )
            }
            Node::Internal { children } => {
                let (first, second) = quadratic_split(children, min_fill);
                for child in &second.items {
                    self.nodes[child.node].parent = Some(sibling_id);
                }
                (
                    (Node::Internal { children: first.items }, first.mbr),
                    (Node::Internal { children: second.items }, second.mbr),
                )
            }
        };

        log::trace!(
            "Split node {} ({} items) into {} + {} (new node {})",
            node_id,
            kept.len() + moved.len(),
            kept.len(),
            moved.len(),
            sibling_id
        );

        let slot = &mut self.nodes[node_id];
        slot.node = kept;
        slot.mbr = kept_mbr;
        self.nodes.push(NodeSlot {
            node: moved,
            mbr: moved_mbr,
            parent,
        });

        sibling_id
    }

    /// Propagate MBR changes and splits from `node_id` up to the root.
    ///
    /// `sibling` is the second half of `node_id` when it was just split. Each
    /// step refreshes `node_id`'s box in its parent, links the sibling, and
    /// splits the parent in turn if it overflowed. A split root is replaced by
    /// a new internal root holding both halves.
    fn adjust_tree(&mut self, mut node_id: NodeId, mut sibling: Option<NodeId>) {
        let max_fanout = self.config.max_fanout();

        loop {
            let Some(parent_id) = self.nodes[node_id].parent else {
                if let Some(sibling_id) = sibling {
                    self.grow_root(node_id, sibling_id);
                }
                return;
            };

            let node_mbr = self.nodes[node_id].mbr;
            let sibling_ref = sibling.map(|id| ChildRef {
                bbox: self.nodes[id].mbr,
                node: id,
            });

            let slot = &mut self.nodes[parent_id];
            let previous_mbr = slot.mbr;
            let children = match &mut slot.node {
                Node::Internal { children } => children,
                Node::Leaf { .. } => {
                    unreachable!("parent {} of node {} is a leaf", parent_id, node_id)
                }
            };
            match children.iter_mut().find(|c| c.node == node_id) {
                Some(child) => child.bbox = node_mbr,
                None => unreachable!("node {} missing from parent {}", node_id, parent_id),
            }
            if let Some(child) = sibling_ref {
                children.push(child);
            }
            let overflow = children.len() > max_fanout;
            slot.mbr = union_all(children.iter().map(|c| &c.bbox));

            if let Some(sibling_id) = sibling {
                self.nodes[sibling_id].parent = Some(parent_id);
            } else if self.nodes[parent_id].mbr == previous_mbr {
                // Nothing above can change.
                return;
            }

            sibling = if overflow {
                Some(self.split_node(parent_id))
            } else {
                None
            };
            node_id = parent_id;
        }
    }

    /// Replace the root with a new internal node over the two split halves.
    fn grow_root(&mut self, old_root: NodeId, sibling: NodeId) {
        let new_root = self.nodes.len();
        let children = vec![
            ChildRef {
                bbox: self.nodes[old_root].mbr,
                node: old_root,
            },
            ChildRef {
                bbox: self.nodes[sibling].mbr,
                node: sibling,
            },
        ];
        debug_assert_eq!(children.len(), ROOT_SPLIT_CHILDREN);

        self.nodes.push(NodeSlot::new(Node::Internal { children }, None));
        self.nodes[old_root].parent = Some(new_root);
        self.nodes[sibling].parent = Some(new_root);
        self.root = new_root;
        self.height += 1;

        log::debug!("R-Tree root split, height is now {}", self.height);
    }

    fn search_recursive(&self, node_id: NodeId, target: &BoundingBox) -> bool {
        match &self.nodes[node_id].node {
            Node::Leaf { entries } => entries.iter().any(|e| e.bbox() == target),
            Node::Internal { children } => children
                .iter()
                .any(|c| c.bbox.contains(target) && self.search_recursive(c.node, target)),
        }
    }

    fn contained_recursive<'a>(
        &'a self,
        node_id: NodeId,
        query: &BoundingBox,
        results: &mut Vec<&'a LeafEntry<T>>,
    ) {
        match &self.nodes[node_id].node {
            Node::Leaf { entries } => {
                results.extend(entries.iter().filter(|e| query.contains(e.bbox())));
            }
            Node::Internal { children } => {
                for child in children {
                    // a contained entry can sit in a child that only partially
                    // overlaps the query
                    if child.bbox.intersects(query) {
                        self.contained_recursive(child.node, query, results);
                    }
                }
            }
        }
    }

    fn nearest_recursive<'a>(
        &'a self,
        node_id: NodeId,
        x: f64,
        y: f64,
        k: usize,
        results: &mut Vec<(&'a LeafEntry<T>, f64)>,
        max_dist: &mut f64,
    ) {
        match &self.nodes[node_id].node {
            Node::Leaf { entries } => {
                for entry in entries {
                    let dist = entry.bbox().distance_to_point(x, y);
                    if dist > *max_dist {
                        continue;
                    }

                    results.push((entry, dist));
                    if results.len() > k {
                        results.sort_by(|a, b| a.1.total_cmp(&b.1));
                        results.truncate(k);
                        if let Some((_, kth_dist)) = results.last() {
                            *max_dist = *kth_dist;
                        }
                    }
                }
            }
            Node::Internal { children } => {
                let mut candidates: Vec<_> = children
                    .iter()
                    .map(|child| (child.node, child.bbox.distance_to_point(x, y)))
                    .collect();
                candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

                for (child, dist) in candidates {
                    if dist > *max_dist {
                        continue;
                    }
                    self.nearest_recursive(child, x, y, k, results, max_dist);
                }
            }
        }
    }

    fn integrity_recursive(
        &self,
        node_id: NodeId,
        expected_parent: Option<NodeId>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
        entries: &mut u64,
        report: &mut IntegrityReport,
    ) {
        report.nodes_checked += 1;
        let slot = &self.nodes[node_id];
        let is_root = node_id == self.root;
        let min = self.config.min_fanout();
        let max = self.config.max_fanout();

        if slot.parent != expected_parent {
            report.fail(format!(
                "Node {} has parent {:?}, expected {:?}",
                node_id, slot.parent, expected_parent
            ));
        }

        let computed = slot.node.compute_bbox();
        if slot.mbr != computed {
            report.fail(format!(
                "Node {} MBR {} differs from union of contents {}",
                node_id, slot.mbr, computed
            ));
        }

        let len = slot.node.len();
        let (lower, upper) = match (&slot.node, is_root) {
            (Node::Leaf { .. }, true) => (0, max),
            (Node::Internal { .. }, true) => (ROOT_SPLIT_CHILDREN, max),
            (_, false) => (min, max),
        };
        if len < lower || len > upper {
            report.fail(format!(
                "Node {} holds {} items, allowed range is [{}, {}]",
                node_id, len, lower, upper
            ));
        }

        match &slot.node {
            Node::Leaf { entries: leaf_entries } => {
                *entries += leaf_entries.len() as u64;
                match *leaf_depth {
                    None => *leaf_depth = Some(depth),
                    Some(d) if d != depth => report.fail(format!(
                        "Leaf {} at depth {}, other leaves at depth {}",
                        node_id, depth, d
                    )),
                    Some(_) => {}
                }
            }
            Node::Internal { children } => {
                for child in children {
                    if child.node >= self.nodes.len() {
                        report.fail(format!(
                            "Node {} references missing node {}",
                            node_id, child.node
                        ));
                        continue;
                    }
                    if child.bbox != self.nodes[child.node].mbr {
                        report.fail(format!(
                            "Node {} stores {} for child {}, child MBR is {}",
                            node_id, child.bbox, child.node, self.nodes[child.node].mbr
                        ));
                    }
                    self.integrity_recursive(
                        child.node,
                        Some(node_id),
                        depth + 1,
                        leaf_depth,
                        entries,
                        report,
                    );
                }
            }
        }
    }
}

impl<T> Default for RTree<T> {
    /// Empty tree using [`RTreeConfig::default`].
    fn default() -> Self {
        Self::from_valid_config(RTreeConfig::default())
    }
}

impl<'a, T> IntoIterator for &'a RTree<T> {
    type Item = &'a LeafEntry<T>;
    type IntoIter = RangeQuery<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn check_box(bbox: &BoundingBox) -> SpatialResult<()> {
    if bbox.is_valid() {
        Ok(())
    } else {
        Err(SpatialError::malformed_box(bbox))
    }
}

/// Least enlargement, then smallest resulting area, then first in order.
fn best_child(children: &[ChildRef], bbox: &BoundingBox) -> usize {
    let mut best_idx = 0;
    let mut best_enlargement = f64::INFINITY;
    let mut best_area = f64::INFINITY;

    for (i, child) in children.iter().enumerate() {
        let enlargement = child.bbox.enlargement(bbox);
        let area = child.bbox.area() + enlargement;

        if enlargement < best_enlargement
            || (enlargement == best_enlargement && area < best_area)
        {
            best_enlargement = enlargement;
            best_area = area;
            best_idx = i;
        }
    }

    best_idx
}

// ============================================================================
// Tests
// ============================================================================
