//! Per-zoom R-tree used to answer viewport range queries.
//!
//! Each zoom level of a cluster index freezes its features into one
//! bulk-loaded `rstar` tree over projected coordinates. Entries carry the
//! feature's ordinal within the level so callers can restore a stable order
//! independent of tree traversal.

use rstar::{AABB, Point as RstarPoint, RTree};

/// A projected feature position tagged with its ordinal in the level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelPoint {
    pub x: f64,
    pub y: f64,
    pub ordinal: u32,
}

impl LevelPoint {
    pub fn new(x: f64, y: f64, ordinal: u32) -> Self {
        Self { x, y, ordinal }
    }
}

impl RstarPoint for LevelPoint {
    type Scalar = f64;
    const DIMENSIONS: usize = 2;

    fn generate(mut generator: impl FnMut(usize) -> Self::Scalar) -> Self {
        Self {
            x: generator(0),
            y: generator(1),
            ordinal: u32::MAX,
        }
    }

    fn nth(&self, index: usize) -> Self::Scalar {
        match index {
            0 => self.x,
            1 => self.y,
            _ => unreachable!(),
        }
    }

    fn nth_mut(&mut self, index: usize) -> &mut Self::Scalar {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => unreachable!(),
        }
    }
}

/// Immutable range index over the features of one zoom level.
#[derive(Debug, Clone)]
pub struct LevelTree {
    tree: RTree<LevelPoint>,
}

impl LevelTree {
    /// Bulk-load the positions; ordinal `i` is `positions[i]`.
    pub fn build(positions: &[[f64; 2]]) -> Self {
        let points = positions
            .iter()
            .enumerate()
            .map(|(ordinal, &[x, y])| LevelPoint::new(x, y, ordinal as u32))
            .collect();
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Ordinals of all entries inside the closed rectangle, in ascending order.
    pub fn range(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<u32> {
        if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
            log::warn!("Rejecting level range query with non-finite coordinates");
            return Vec::new();
        }

        let min_corner = LevelPoint::new(min_x.min(max_x), min_y.min(max_y), u32::MAX);
        let max_corner = LevelPoint::new(min_x.max(max_x), min_y.max(max_y), u32::MAX);
        let envelope = AABB::from_corners(min_corner, max_corner);

        let mut ordinals: Vec<u32> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|point| point.ordinal)
            .collect();
        ordinals.sort_unstable();
        ordinals
    }
}
