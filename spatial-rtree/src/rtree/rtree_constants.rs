//! Constants for the in-memory R-Tree.

/// Default minimum number of entries (leaf) or children (internal) per node
pub const DEFAULT_MIN_FANOUT: usize = 25;

/// Default maximum number of entries (leaf) or children (internal) per node
pub const DEFAULT_MAX_FANOUT: usize = 64;

/// Smallest legal minimum fanout
pub const MIN_FANOUT_LOWER_BOUND: usize = 1;

/// Children of a freshly promoted root (the two halves of the old root)
pub const ROOT_SPLIT_CHILDREN: usize = 2;
