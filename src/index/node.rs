//! Node arena entries and the public cluster/leaf sum type.

use geo::Point;
use geocluster_types::point::MarkerPoint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Slot of a node in an index's arena.
pub(crate) type NodeId = u32;

/// Opaque handle to an aggregate in one specific index build.
///
/// The high 32 bits hold the build generation and the low 32 bits the arena
/// slot, so a handle kept across a rebuild is recognised as stale rather than
/// resolving to an unrelated cluster.
///
/// ```
/// use geocluster::ClusterId;
///
/// let id = ClusterId::from_u64(0x0000_0002_0000_0010);
/// assert_eq!(id.as_u64(), 0x0000_0002_0000_0010);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(u64);

impl ClusterId {
    pub(crate) fn new(generation: u32, slot: NodeId) -> Self {
        Self((u64::from(generation) << 32) | u64::from(slot))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn from_u64(raw: u64) -> Self {
        Self(raw)
    }

    pub(crate) fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    pub(crate) fn slot(self) -> NodeId {
        (self.0 & u64::from(u32::MAX)) as u32
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    /// Index into the build's point list
    Leaf { point: u32 },
    /// Members of the finer level merged into this node, in level order
    Aggregate { children: Vec<NodeId> },
}

/// Arena entry. Positions are in projected unit-square space.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub x: f64,
    pub y: f64,
    pub count: usize,
    /// Finest zoom at which this node is a single marker
    pub zoom: u8,
    pub kind: NodeKind,
}

/// A single input point as returned by queries and leaf expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub point: Arc<MarkerPoint>,
}

impl Leaf {
    pub fn position(&self) -> Point<f64> {
        self.point.position
    }
}

/// Several nearby points merged into one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub id: ClusterId,
    /// Centroid in degrees (x = longitude, y = latitude)
    pub position: Point<f64>,
    /// Leaf points under this aggregate, through nested aggregates
    pub point_count: usize,
    /// Zoom at which the merge happened; finer zooms show its children
    pub zoom: u8,
}

impl Aggregate {
    /// Short label for the point count: `"999"`, `"1.2k"`, `"12k"`.
    pub fn abbreviated_count(&self) -> String {
        abbreviate_count(self.point_count)
    }
}

/// Either a merged cluster or an individual point.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterNode {
    Leaf(Leaf),
    Aggregate(Aggregate),
}

impl ClusterNode {
    pub fn position(&self) -> Point<f64> {
        match self {
            ClusterNode::Leaf(leaf) => leaf.position(),
            ClusterNode::Aggregate(aggregate) => aggregate.position,
        }
    }

    pub fn point_count(&self) -> usize {
        match self {
            ClusterNode::Leaf(_) => 1,
            ClusterNode::Aggregate(aggregate) => aggregate.point_count,
        }
    }

    pub fn cluster_id(&self) -> Option<ClusterId> {
        match self {
            ClusterNode::Leaf(_) => None,
            ClusterNode::Aggregate(aggregate) => Some(aggregate.id),
        }
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self, ClusterNode::Aggregate(_))
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            ClusterNode::Leaf(leaf) => Some(leaf),
            ClusterNode::Aggregate(_) => None,
        }
    }

    pub fn as_aggregate(&self) -> Option<&Aggregate> {
        match self {
            ClusterNode::Leaf(_) => None,
            ClusterNode::Aggregate(aggregate) => Some(aggregate),
        }
    }
}

pub(crate) fn abbreviate_count(count: usize) -> String {
    if count >= 10_000 {
        format!("{}k", (count as f64 / 1000.0).round())
    } else if count >= 1000 {
        format!("{}k", (count as f64 / 100.0).round() / 10.0)
    } else {
        count.to_string()
    }
}
