//! R-Tree configuration module.
//!
//! This module provides the node capacity parameters of an [`RTree`](super::RTree).

use serde::{Deserialize, Serialize};

use super::rtree_constants::{DEFAULT_MAX_FANOUT, DEFAULT_MIN_FANOUT, MIN_FANOUT_LOWER_BOUND};
use super::rtree_types::{SpatialError, SpatialResult};

/// Node capacity configuration.
///
/// `min_fanout` (`m`) and `max_fanout` (`M`) bound the number of entries in a
/// leaf and the number of children in an internal node. A valid pair has
/// `m >= 1` and `M >= 2m`, which guarantees that an overflowing node of
/// `M + 1` items can always be split into two halves of at least `m` items.
///
/// # Example
///
/// ```rust
/// use spatial_rtree::RTreeConfig;
///
/// let config = RTreeConfig::new()
///     .with_min_fanout(2)
///     .with_max_fanout(4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTreeConfig {
    /// Minimum fill of every non-root node.
    min_fanout: usize,

    /// Maximum fill of every node; one more item triggers a split.
    max_fanout: usize,
}

impl RTreeConfig {
    /// Creates a new configuration with default values.
    ///
    /// Defaults:
    /// - Min fanout: 25
    /// - Max fanout: 64
    #[inline]
    pub fn new() -> Self {
        Self {
            min_fanout: DEFAULT_MIN_FANOUT,
            max_fanout: DEFAULT_MAX_FANOUT,
        }
    }

    /// Returns the minimum fanout `m`.
    #[inline]
    pub fn min_fanout(&self) -> usize {
        self.min_fanout
    }

    /// Sets the minimum fanout.
    /// Builder-style method for chaining.
    #[inline]
    pub fn with_min_fanout(mut self, min_fanout: usize) -> Self {
        self.min_fanout = min_fanout;
        self
    }

    /// Returns the maximum fanout `M`.
    #[inline]
    pub fn max_fanout(&self) -> usize {
        self.max_fanout
    }

    /// Sets the maximum fanout.
    /// Builder-style method for chaining.
    #[inline]
    pub fn with_max_fanout(mut self, max_fanout: usize) -> Self {
        self.max_fanout = max_fanout;
        self
    }

    /// Checks the `m >= 1` and `M >= 2m` constraints.
    pub fn validate(&self) -> SpatialResult<()> {
        if self.min_fanout < MIN_FANOUT_LOWER_BOUND {
            return Err(SpatialError::Config(format!(
                "min_fanout must be at least {}, got {}",
                MIN_FANOUT_LOWER_BOUND, self.min_fanout
            )));
        }
        if self.max_fanout < self.min_fanout.saturating_mul(2) {
            return Err(SpatialError::Config(format!(
                "max_fanout ({}) must be at least twice min_fanout ({})",
                self.max_fanout, self.min_fanout
            )));
        }
        Ok(())
    }
}

impl Default for RTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}
