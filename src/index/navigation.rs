//! Drill-down from an aggregate to its children and leaves.

use super::{Aggregate, ClusterId, ClusterIndex, ClusterNode, Leaf, Node, NodeId, NodeKind};
use crate::error::{ClusterError, Result};

impl ClusterIndex {
    /// Resolve an id to its arena node, rejecting ids from other builds and
    /// ids that do not name an aggregate.
    fn resolve(&self, id: ClusterId) -> Result<(NodeId, &Node, &[NodeId])> {
        if id.generation() != self.generation {
            return Err(ClusterError::UnknownClusterId(id));
        }
        let slot = id.slot();
        let node = self
            .nodes
            .get(slot as usize)
            .ok_or(ClusterError::UnknownClusterId(id))?;
        match &node.kind {
            NodeKind::Aggregate { children } => Ok((slot, node, children.as_slice())),
            NodeKind::Leaf { .. } => Err(ClusterError::UnknownClusterId(id)),
        }
    }

    /// The aggregate named by `id`.
    pub fn get_cluster(&self, id: ClusterId) -> Result<Aggregate> {
        let (slot, node, _) = self.resolve(id)?;
        Ok(self.aggregate(slot, node))
    }

    /// Number of leaf points under an aggregate.
    pub fn get_leaf_count(&self, id: ClusterId) -> Result<usize> {
        let (_, node, _) = self.resolve(id)?;
        Ok(node.count)
    }

    /// Direct children of an aggregate at the next finer zoom, in level order.
    pub fn get_children(&self, id: ClusterId) -> Result<Vec<ClusterNode>> {
        let (_, _, children) = self.resolve(id)?;
        Ok(children
            .iter()
            .map(|&child| self.to_cluster_node(child))
            .collect())
    }

    /// Up to `limit` leaves under an aggregate, skipping the first `offset`.
    ///
    /// Leaves come depth-first with children in level order, which is the
    /// same for every call against this index. `limit = None` returns all
    /// remaining leaves.
    pub fn get_leaves(
        &self,
        id: ClusterId,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Leaf>> {
        let (_, node, children) = self.resolve(id)?;
        let limit = limit.unwrap_or(usize::MAX);

        let mut leaves = Vec::with_capacity(limit.min(node.count.saturating_sub(offset)));
        if limit > 0 {
            let mut skipped = 0;
            self.append_leaves(children, limit, offset, &mut skipped, &mut leaves);
        }
        Ok(leaves)
    }

    fn append_leaves(
        &self,
        children: &[NodeId],
        limit: usize,
        offset: usize,
        skipped: &mut usize,
        out: &mut Vec<Leaf>,
    ) {
        for &child in children {
            if out.len() >= limit {
                return;
            }
            let node = self.node(child);
            match &node.kind {
                NodeKind::Aggregate { children } => {
                    if *skipped + node.count <= offset {
                        // whole subtree lies before the page
                        *skipped += node.count;
                    } else {
                        self.append_leaves(children, limit, offset, skipped, out);
                    }
                }
                NodeKind::Leaf { point } => {
                    if *skipped < offset {
                        *skipped += 1;
                    } else {
                        out.push(self.leaf(*point));
                    }
                }
            }
        }
    }

    /// Zoom at which the aggregate first shows as more than one marker.
    ///
    /// An aggregate is a single marker from its merge zoom down to wherever a
    /// coarser merge absorbs it, and its children appear one zoom finer. The
    /// result never exceeds `max_zoom + 1`, the level where every point is a
    /// leaf; co-located points that never separate report that ceiling.
    pub fn get_cluster_expansion_zoom(&self, id: ClusterId) -> Result<u8> {
        let (_, node, _) = self.resolve(id)?;
        Ok((node.zoom + 1).min(self.options.max_zoom + 1))
    }
}
