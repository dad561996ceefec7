//! Lazy, read-only walks over the node arena.
//!
//! Both iterators keep their own cursor state, so every call on the tree
//! starts an independent traversal.

use std::collections::VecDeque;

use crate::bounding_box::BoundingBox;

use super::rtree_types::{LeafEntry, LevelOrderRecord, Node, NodeId, NodeSlot};

/// Depth-first window query over an explicit node stack.
///
/// Yields every leaf entry whose box intersects the query box, or every entry
/// when constructed without a filter. Order follows tree layout and must not
/// be relied upon.
pub struct RangeQuery<'a, T> {
    nodes: &'a [NodeSlot<T>],
    query: Option<BoundingBox>,
    stack: Vec<NodeId>,
    current: std::slice::Iter<'a, LeafEntry<T>>,
}

impl<'a, T> RangeQuery<'a, T> {
    pub(crate) fn new(
        nodes: &'a [NodeSlot<T>],
        root: NodeId,
        query: Option<BoundingBox>,
    ) -> Self {
        let mut stack = Vec::new();
        let admit_root = match (&query, nodes.get(root)) {
            (Some(q), Some(slot)) => slot.mbr.intersects(q),
            (None, Some(_)) => true,
            _ => false,
        };
        if admit_root {
            stack.push(root);
        }

        let no_entries: &'a [LeafEntry<T>] = &[];
        Self {
            nodes,
            query,
            stack,
            current: no_entries.iter(),
        }
    }

    fn admits(&self, bbox: &BoundingBox) -> bool {
        match &self.query {
            Some(q) => bbox.intersects(q),
            None => true,
        }
    }
}

impl<'a, T> Iterator for RangeQuery<'a, T> {
    type Item = &'a LeafEntry<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while let Some(entry) = self.current.next() {
                if self.admits(entry.bbox()) {
                    return Some(entry);
                }
            }

            let node_id = self.stack.pop()?;
            match &self.nodes[node_id].node {
                Node::Leaf { entries } => {
                    self.current = entries.iter();
                }
                Node::Internal { children } => {
                    // reversed so children are visited in stored order
                    for child in children.iter().rev() {
                        if self.admits(&child.bbox) {
                            self.stack.push(child.node);
                        }
                    }
                }
            }
        }
    }
}

/// Breadth-first walk producing one [`LevelOrderRecord`] per node.
pub struct LevelOrder<'a, T> {
    nodes: &'a [NodeSlot<T>],
    queue: VecDeque<(NodeId, usize)>,
}

impl<'a, T> LevelOrder<'a, T> {
    pub(crate) fn new(nodes: &'a [NodeSlot<T>], root: NodeId) -> Self {
        let mut queue = VecDeque::new();
        if root < nodes.len() {
            queue.push_back((root, 0));
        }
        Self { nodes, queue }
    }
}

impl<'a, T> Iterator for LevelOrder<'a, T> {
    type Item = LevelOrderRecord<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let (node_id, depth) = self.queue.pop_front()?;
        let slot = &self.nodes[node_id];
        let mbr = if slot.mbr.is_empty() { None } else { Some(slot.mbr) };

        let record = match &slot.node {
            Node::Leaf { entries } => LevelOrderRecord {
                depth,
                mbr,
                is_leaf: true,
                count: entries.len(),
                entries: entries.as_slice(),
            },
            Node::Internal { children } => {
                for child in children {
                    self.queue.push_back((child.node, depth + 1));
                }
                LevelOrderRecord {
                    depth,
                    mbr,
                    is_leaf: false,
                    count: children.len(),
                    entries: &[],
                }
            }
        };

        Some(record)
    }
}
