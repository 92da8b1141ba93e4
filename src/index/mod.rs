//! Hierarchical cluster index.
//!
//! A [`ClusterIndex`] is built once from a point set and is read-only
//! afterwards. All nodes of every zoom level live in one flat arena; each
//! level is a list of arena slots plus an R-tree over their projected
//! positions. A node that is not merged at a coarser zoom is shared by all
//! the levels it survives through.
//!
//! Level `max_zoom + 1` holds every valid input point as a leaf. Levels
//! `max_zoom` down to `min_zoom` are produced by merging the level above.
//!
//! ```rust
//! use geocluster::{ClusterIndex, ClusterOptions, GeoBounds, MarkerPoint, PointId};
//!
//! let points = vec![
//!     MarkerPoint::new(PointId::from(1), 0.0, 0.0),
//!     MarkerPoint::new(PointId::from(2), 0.0, 0.0001),
//!     MarkerPoint::new(PointId::from(3), 50.0, 50.0),
//! ];
//! let index = ClusterIndex::build(points, ClusterOptions::default().with_radius(40.0))?;
//!
//! let world = index.query(&GeoBounds::world(), 0.0);
//! assert_eq!(world.len(), 2);
//! # Ok::<(), geocluster::ClusterError>(())
//! ```

mod navigation;
mod node;
mod query;

pub use node::{Aggregate, ClusterId, ClusterNode, Leaf};
pub(crate) use node::{Node, NodeId, NodeKind};

use crate::compute::cluster::{LevelItem, cluster_level};
use crate::compute::projection::{lat_y, lng_x, x_lng, y_lat};
use crate::compute::spatial::level_tree::LevelTree;
use crate::compute::validation::{RawPoint, normalize_points, retain_valid};
use crate::config::ClusterOptions;
use crate::error::{ClusterError, Result};
use geocluster_types::point::MarkerPoint;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Source of build generations. Zero is reserved for "no index yet".
static NEXT_GENERATION: AtomicU32 = AtomicU32::new(1);

fn next_generation() -> u32 {
    let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
    if generation == 0 {
        // wrapped; skip the reserved value
        NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
    } else {
        generation
    }
}

/// Counters describing one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Records handed to the build
    pub input: usize,
    /// Records that passed validation and were indexed
    pub indexed: usize,
    /// Records dropped for invalid coordinates
    pub dropped: usize,
    /// Aggregates created across all levels
    pub clusters: usize,
    /// Zoom levels stored, including the leaf level
    pub levels: usize,
}

/// Features of one zoom level.
#[derive(Debug, Clone)]
pub(crate) struct Level {
    pub nodes: Vec<NodeId>,
    pub tree: LevelTree,
}

impl Level {
    fn new(nodes: Vec<NodeId>, arena: &[Node]) -> Self {
        let positions: Vec<[f64; 2]> = nodes
            .iter()
            .map(|&id| {
                let node = &arena[id as usize];
                [node.x, node.y]
            })
            .collect();
        Self {
            tree: LevelTree::build(&positions),
            nodes,
        }
    }
}

/// Immutable multi-zoom cluster hierarchy over a fixed point set.
#[derive(Debug, Clone)]
pub struct ClusterIndex {
    generation: u32,
    options: ClusterOptions,
    points: Vec<Arc<MarkerPoint>>,
    nodes: Vec<Node>,
    /// `levels[i]` is zoom `min_zoom + i`; the last entry is the leaf level
    levels: Vec<Level>,
    stats: BuildStats,
}

impl ClusterIndex {
    /// Build the full hierarchy for `points`.
    ///
    /// Points with non-finite or out-of-range coordinates are dropped and
    /// counted in [`BuildStats::dropped`]. Invalid options fail the build.
    pub fn build(
        points: impl IntoIterator<Item = MarkerPoint>,
        options: ClusterOptions,
    ) -> Result<Self> {
        options.validate()?;

        let points: Vec<MarkerPoint> = points.into_iter().collect();
        let input = points.len();
        let (valid, dropped) = retain_valid(points);

        if valid.len() > u32::MAX as usize {
            return Err(ClusterError::InvalidConfig(format!(
                "Too many points for one index: {}",
                valid.len()
            )));
        }

        let generation = next_generation();
        let leaf_zoom = options.max_zoom + 1;

        let mut nodes: Vec<Node> = valid
            .iter()
            .enumerate()
            .map(|(i, point)| Node {
                x: lng_x(point.longitude()),
                y: lat_y(point.latitude()),
                count: 1,
                zoom: leaf_zoom,
                kind: NodeKind::Leaf { point: i as u32 },
            })
            .collect();
        let points: Vec<Arc<MarkerPoint>> = valid.into_iter().map(Arc::new).collect();

        let mut current: Vec<NodeId> = (0..nodes.len() as u32).collect();
        let mut fine_to_coarse = vec![current.clone()];
        let mut clusters = 0;

        for zoom in (options.min_zoom..=options.max_zoom).rev() {
            let positions: Vec<[f64; 2]> = current
                .iter()
                .map(|&id| [nodes[id as usize].x, nodes[id as usize].y])
                .collect();
            let counts: Vec<usize> = current.iter().map(|&id| nodes[id as usize].count).collect();

            let mut next = Vec::new();
            for item in cluster_level(&positions, &counts, zoom, &options) {
                match item {
                    LevelItem::Carry(slot) => next.push(current[slot as usize]),
                    LevelItem::Merge {
                        members,
                        x,
                        y,
                        count,
                    } => {
                        let Ok(id) = NodeId::try_from(nodes.len()) else {
                            return Err(ClusterError::InvalidConfig(
                                "Cluster hierarchy exceeds the node arena capacity".to_string(),
                            ));
                        };
                        let children = members.iter().map(|&m| current[m as usize]).collect();
                        nodes.push(Node {
                            x,
                            y,
                            count,
                            zoom,
                            kind: NodeKind::Aggregate { children },
                        });
                        next.push(id);
                        clusters += 1;
                    }
                }
            }

            log::trace!(
                "Zoom {}: {} features from {} at the finer level",
                zoom,
                next.len(),
                current.len()
            );
            fine_to_coarse.push(next.clone());
            current = next;
        }

        let levels: Vec<Level> = fine_to_coarse
            .into_iter()
            .rev()
            .map(|ids| Level::new(ids, &nodes))
            .collect();

        let stats = BuildStats {
            input,
            indexed: points.len(),
            dropped,
            clusters,
            levels: levels.len(),
        };

        if dropped > 0 {
            log::warn!("Dropped {} of {} points with invalid coordinates", dropped, input);
        }
        log::debug!(
            "Built cluster index generation {}: {} points, {} clusters, zooms {}..={}",
            generation,
            stats.indexed,
            stats.clusters,
            options.min_zoom,
            options.max_zoom
        );

        Ok(Self {
            generation,
            options,
            points,
            nodes,
            levels,
            stats,
        })
    }

    /// Build from loosely typed records, dropping those with missing or
    /// invalid coordinates.
    pub fn build_from_raw(
        records: impl IntoIterator<Item = RawPoint>,
        options: ClusterOptions,
    ) -> Result<Self> {
        let (points, missing) = normalize_points(records);
        let mut index = Self::build(points, options)?;
        index.stats.input += missing;
        index.stats.dropped += missing;
        Ok(index)
    }

    /// Identity of this build. Distinct for every build in the process.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The indexed points, in input order.
    pub fn points(&self) -> &[Arc<MarkerPoint>] {
        &self.points
    }

    /// Zoom of the level that serves `zoom`: floored and clamped to
    /// `min_zoom..=max_zoom + 1`.
    pub fn level_zoom(&self, zoom: f64) -> u8 {
        let min = f64::from(self.options.min_zoom);
        let max = f64::from(self.options.max_zoom) + 1.0;
        if zoom.is_finite() {
            zoom.floor().clamp(min, max) as u8
        } else {
            self.options.min_zoom
        }
    }

    pub(crate) fn level(&self, zoom: u8) -> &Level {
        &self.levels[usize::from(zoom - self.options.min_zoom)]
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    /// Public view of an arena node.
    pub(crate) fn to_cluster_node(&self, id: NodeId) -> ClusterNode {
        let node = self.node(id);
        match &node.kind {
            NodeKind::Leaf { point } => ClusterNode::Leaf(self.leaf(*point)),
            NodeKind::Aggregate { .. } => ClusterNode::Aggregate(self.aggregate(id, node)),
        }
    }

    pub(crate) fn leaf(&self, point: u32) -> Leaf {
        Leaf {
            point: Arc::clone(&self.points[point as usize]),
        }
    }

    pub(crate) fn aggregate(&self, id: NodeId, node: &Node) -> Aggregate {
        Aggregate {
            id: ClusterId::new(self.generation, id),
            position: geo::Point::new(x_lng(node.x), y_lat(node.y)),
            point_count: node.count,
            zoom: node.zoom,
        }
    }
}
