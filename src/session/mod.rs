//! Stateful query surface for one map view.
//!
//! A [`ViewportClusterSession`] owns the current [`ClusterIndex`] and the
//! current [`Viewport`]. The index is replaced wholesale on every rebuild and
//! never mutated; the viewport changes on every pan or zoom. Visible features
//! are computed lazily and cached until either of the two changes.
//!
//! ```rust
//! use geocluster::{ClusterOptions, GeoBounds, MarkerPoint, PointId, ViewportClusterSession};
//!
//! let mut session = ViewportClusterSession::new(ClusterOptions::default())?;
//! session.set_points(vec![
//!     MarkerPoint::new(PointId::from(1), 2.35, 48.85),
//!     MarkerPoint::new(PointId::from(2), 2.36, 48.86),
//! ])?;
//! session.set_viewport(GeoBounds::new(-10.0, 40.0, 10.0, 55.0), 4.0);
//!
//! let visible = session.get_visible();
//! assert_eq!(visible.len(), 1);
//! assert_eq!(visible[0].point_count(), 2);
//! # Ok::<(), geocluster::ClusterError>(())
//! ```

#[cfg(feature = "sync")]
pub mod sync;

use crate::compute::validation::RawPoint;
use crate::config::ClusterOptions;
use crate::error::{ClusterError, Result};
use crate::index::{BuildStats, ClusterId, ClusterIndex, ClusterNode, Leaf};
use geocluster_types::bbox::GeoBounds;
use geocluster_types::point::MarkerPoint;
use geocluster_types::viewport::Viewport;
use std::sync::Arc;

/// Permission to install the result of one rebuild.
///
/// Tickets are ordered; only the most recently issued one may install its
/// index, so a slow build that finishes after a newer one is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RebuildTicket {
    sequence: u64,
}

impl RebuildTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Cache key for [`ViewportClusterSession::get_visible`]. Floats are
/// compared bitwise so that `NaN` never defeats the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VisibleKey {
    generation: u32,
    bounds: [u64; 4],
    zoom: u64,
    padding: u64,
}

impl VisibleKey {
    fn new(generation: u32, viewport: &Viewport, padding: f64) -> Self {
        let b = &viewport.bounds;
        Self {
            generation,
            bounds: [
                b.west.to_bits(),
                b.south.to_bits(),
                b.east.to_bits(),
                b.north.to_bits(),
            ],
            zoom: viewport.zoom.to_bits(),
            padding: padding.to_bits(),
        }
    }
}

#[derive(Debug, Clone)]
struct VisibleCache {
    key: VisibleKey,
    nodes: Vec<ClusterNode>,
}

/// One map surface's view onto a clustered point set.
#[derive(Debug, Clone)]
pub struct ViewportClusterSession {
    options: ClusterOptions,
    index: Option<Arc<ClusterIndex>>,
    viewport: Viewport,
    /// Applied rebuilds so far
    version: u64,
    /// Last ticket handed out
    issued: u64,
    /// Last ticket whose index was installed
    applied: u64,
    visible: Option<VisibleCache>,
}

impl ViewportClusterSession {
    /// Create an empty session. The options are validated here so that a
    /// bad configuration fails before any points arrive.
    pub fn new(options: ClusterOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            index: None,
            viewport: Viewport::default(),
            version: 0,
            issued: 0,
            applied: 0,
            visible: None,
        })
    }

    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    /// Replace the options used by subsequent builds and by the visible-set
    /// padding. The current index is kept until the next rebuild.
    pub fn set_options(&mut self, options: ClusterOptions) -> Result<()> {
        options.validate()?;
        self.options = options;
        self.visible = None;
        Ok(())
    }

    /// The index currently serving queries, if any build has completed.
    pub fn index(&self) -> Option<&Arc<ClusterIndex>> {
        self.index.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Number of rebuilds applied to this session. Every increment
    /// invalidates all previously returned cluster ids.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Rebuild from `points` with the session's options.
    ///
    /// A successful build supersedes any rebuild still in flight through
    /// [`begin_rebuild`]. On failure the previous index and any in-flight
    /// rebuild stay untouched.
    ///
    /// [`begin_rebuild`]: ViewportClusterSession::begin_rebuild
    pub fn set_points(&mut self, points: impl IntoIterator<Item = MarkerPoint>) -> Result<BuildStats> {
        let index = ClusterIndex::build(points, self.options.clone())?;
        Ok(self.install(index))
    }

    /// Rebuild from `points` with new `options`. The options are only
    /// adopted when the build succeeds.
    pub fn set_points_with_options(
        &mut self,
        points: impl IntoIterator<Item = MarkerPoint>,
        options: ClusterOptions,
    ) -> Result<BuildStats> {
        let index = ClusterIndex::build(points, options.clone())?;
        self.options = options;
        Ok(self.install(index))
    }

    /// Rebuild from loosely typed source records.
    pub fn set_raw_points(&mut self, records: impl IntoIterator<Item = RawPoint>) -> Result<BuildStats> {
        let index = ClusterIndex::build_from_raw(records, self.options.clone())?;
        Ok(self.install(index))
    }

    /// Install an index built on the calling thread. The ticket is only
    /// taken once the build has succeeded.
    fn install(&mut self, index: ClusterIndex) -> BuildStats {
        let stats = index.stats().clone();
        let ticket = self.begin_rebuild();
        self.finish_rebuild(ticket, index);
        stats
    }

    /// Update the viewport. Nothing is recomputed until the next
    /// [`get_visible`](ViewportClusterSession::get_visible).
    pub fn set_viewport(&mut self, bounds: GeoBounds, zoom: f64) {
        self.viewport = Viewport::new(bounds, zoom);
    }

    /// Features visible in the current viewport, grown by the configured
    /// padding. Repeated calls without a viewport or index change return the
    /// cached result.
    pub fn get_visible(&mut self) -> &[ClusterNode] {
        let Some(index) = self.index.as_ref() else {
            return &[];
        };

        let key = VisibleKey::new(index.generation(), &self.viewport, self.options.padding);
        let fresh = match &self.visible {
            Some(cache) => cache.key != key,
            None => true,
        };
        if fresh {
            let nodes =
                index.query_padded(&self.viewport.bounds, self.viewport.zoom, self.options.padding);
            log::trace!(
                "Recomputed {} visible features at zoom {}",
                nodes.len(),
                self.viewport.zoom
            );
            self.visible = Some(VisibleCache { key, nodes });
        }

        match &self.visible {
            Some(cache) => &cache.nodes,
            None => &[],
        }
    }

    /// The smallest rectangle enclosing every leaf under `id`.
    ///
    /// The result never wraps the antimeridian. A cluster without leaves
    /// yields [`GeoBounds::empty`], which callers must check with
    /// [`GeoBounds::is_empty`] before fitting a view to it.
    pub fn expand_to_bounds(&self, id: ClusterId) -> Result<GeoBounds> {
        let leaves = self.current(id)?.get_leaves(id, None, 0)?;
        Ok(GeoBounds::from_points(
            leaves.iter().map(|leaf| leaf.point.position()),
        ))
    }

    pub fn get_children(&self, id: ClusterId) -> Result<Vec<ClusterNode>> {
        self.current(id)?.get_children(id)
    }

    pub fn get_leaves(&self, id: ClusterId, limit: Option<usize>, offset: usize) -> Result<Vec<Leaf>> {
        self.current(id)?.get_leaves(id, limit, offset)
    }

    pub fn get_cluster_expansion_zoom(&self, id: ClusterId) -> Result<u8> {
        self.current(id)?.get_cluster_expansion_zoom(id)
    }

    /// Reserve the right to install the next index. Issuing a ticket
    /// supersedes every ticket issued before it.
    pub fn begin_rebuild(&mut self) -> RebuildTicket {
        self.issued += 1;
        RebuildTicket {
            sequence: self.issued,
        }
    }

    /// Install `index` if `ticket` is still the newest one issued.
    ///
    /// Returns `false` and drops the index when a newer rebuild has been
    /// started or the ticket was already used. The swap itself is a single
    /// pointer replacement, so readers see either the old index or the new
    /// one.
    pub fn finish_rebuild(&mut self, ticket: RebuildTicket, index: ClusterIndex) -> bool {
        if ticket.sequence != self.issued || ticket.sequence <= self.applied {
            log::debug!(
                "Discarding superseded rebuild {} (latest issued {})",
                ticket.sequence,
                self.issued
            );
            return false;
        }

        self.applied = ticket.sequence;
        self.version += 1;
        self.index = Some(Arc::new(index));
        self.visible = None;
        log::debug!("Installed cluster index as session version {}", self.version);
        true
    }

    fn current(&self, id: ClusterId) -> Result<&ClusterIndex> {
        self.index
            .as_deref()
            .ok_or(ClusterError::UnknownClusterId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geocluster_types::point::PointId;

    fn marker(id: i64, lng: f64, lat: f64) -> MarkerPoint {
        MarkerPoint::new(PointId::Number(id), lng, lat)
    }

    fn session_with(points: Vec<MarkerPoint>) -> ViewportClusterSession {
        let mut session = ViewportClusterSession::new(ClusterOptions::default()).unwrap();
        session.set_points(points).unwrap();
        session
    }

    #[test]
    fn test_new_rejects_invalid_options() {
        let result = ViewportClusterSession::new(ClusterOptions::default().with_min_points(1));
        assert!(matches!(result, Err(ClusterError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_session_has_nothing_visible() {
        let mut session = ViewportClusterSession::new(ClusterOptions::default()).unwrap();
        session.set_viewport(GeoBounds::world(), 3.0);
        assert!(session.get_visible().is_empty());
        assert_eq!(session.version(), 0);

        let id = ClusterId::from_u64(1 << 32);
        assert!(matches!(
            session.get_children(id),
            Err(ClusterError::UnknownClusterId(_))
        ));
    }

    #[test]
    fn test_visible_is_memoized_until_state_changes() {
        let mut session = session_with(vec![marker(1, 0.0, 0.0), marker(2, 0.1, 0.0)]);
        session.set_viewport(GeoBounds::world(), 2.0);

        let first = session.get_visible().to_vec();
        let key = session.visible.as_ref().map(|c| c.key);
        let second = session.get_visible().to_vec();
        assert_eq!(first, second);
        assert_eq!(session.visible.as_ref().map(|c| c.key), key);

        session.set_viewport(GeoBounds::world(), 14.0);
        assert_eq!(session.get_visible().len(), 2);
    }

    #[test]
    fn test_set_points_bumps_version_and_invalidates_ids() {
        let mut session = session_with(vec![marker(1, 0.0, 0.0), marker(2, 0.0, 0.0)]);
        session.set_viewport(GeoBounds::world(), 0.0);
        let id = session.get_visible()[0].cluster_id().unwrap();
        assert_eq!(session.version(), 1);
        assert!(session.get_children(id).is_ok());

        session
            .set_points(vec![marker(1, 0.0, 0.0), marker(2, 0.0, 0.0)])
            .unwrap();
        assert_eq!(session.version(), 2);
        assert!(matches!(
            session.get_children(id),
            Err(ClusterError::UnknownClusterId(stale)) if stale == id
        ));
        assert!(session.get_visible()[0].cluster_id().unwrap() != id);
    }

    #[test]
    fn test_failed_rebuild_keeps_previous_index() {
        let mut session = session_with(vec![marker(1, 0.0, 0.0)]);
        let bad = ClusterOptions::default().with_radius(-1.0);
        assert!(
            session
                .set_points_with_options(vec![marker(2, 5.0, 5.0)], bad)
                .is_err()
        );
        assert_eq!(session.version(), 1);
        assert_eq!(session.options().radius, 64.0);
        assert_eq!(session.index().map(|i| i.len()), Some(1));
    }

    #[test]
    fn test_failed_rebuild_keeps_pending_rebuild_valid() {
        let mut session = ViewportClusterSession::new(ClusterOptions::default()).unwrap();
        let pending = session.begin_rebuild();

        let bad = ClusterOptions::default().with_radius(-1.0);
        assert!(
            session
                .set_points_with_options(vec![marker(1, 0.0, 0.0)], bad)
                .is_err()
        );

        let built = ClusterIndex::build(
            vec![marker(1, 0.0, 0.0), marker(2, 1.0, 1.0)],
            ClusterOptions::default(),
        )
        .unwrap();
        assert!(session.finish_rebuild(pending, built));
        assert_eq!(session.index().map(|i| i.len()), Some(2));
        assert_eq!(session.version(), 1);
    }

    #[test]
    fn test_expand_to_bounds_is_leaf_envelope() {
        let mut session = session_with(vec![marker(1, 10.0, 10.0), marker(2, 20.0, 20.0)]);
        session.set_viewport(GeoBounds::world(), 0.0);
        let id = session.get_visible()[0].cluster_id().unwrap();

        let bounds = session.expand_to_bounds(id).unwrap();
        assert_eq!(bounds, GeoBounds::new(10.0, 10.0, 20.0, 20.0));
    }

    #[test]
    fn test_stale_rebuild_is_discarded() {
        let mut session = ViewportClusterSession::new(ClusterOptions::default()).unwrap();
        let old = session.begin_rebuild();
        let new = session.begin_rebuild();

        let newer = ClusterIndex::build(vec![marker(1, 0.0, 0.0)], ClusterOptions::default()).unwrap();
        let older = ClusterIndex::build(
            vec![marker(1, 0.0, 0.0), marker(2, 1.0, 1.0)],
            ClusterOptions::default(),
        )
        .unwrap();

        assert!(session.finish_rebuild(new, newer));
        assert!(!session.finish_rebuild(old, older));
        assert_eq!(session.index().map(|i| i.len()), Some(1));
        assert_eq!(session.version(), 1);

        // a ticket cannot be used twice
        let again = ClusterIndex::build(Vec::new(), ClusterOptions::default()).unwrap();
        assert!(!session.finish_rebuild(new, again));
    }

    #[test]
    fn test_raw_points_are_normalized() {
        let mut session = ViewportClusterSession::new(ClusterOptions::default()).unwrap();
        let mut missing = RawPoint::new("b", 1.0, 1.0);
        missing.longitude = None;
        let stats = session
            .set_raw_points(vec![RawPoint::new("a", 1.0, 1.0), missing])
            .unwrap();
        assert_eq!(stats.indexed, 1);
        assert_eq!(stats.dropped, 1);
    }
}
