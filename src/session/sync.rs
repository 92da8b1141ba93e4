//! Thread-safe session with background rebuilds.
//!
//! `SyncSession` wraps a [`ViewportClusterSession`] in `Arc<RwLock<_>>` so
//! the render thread and a loader thread can share one view. Large point sets
//! are clustered on a worker thread while the previous index keeps serving
//! queries; the finished index is installed in one swap under the write lock.
//!
//! Enable the `sync` feature to use this module:
//!
//! ```toml
//! [dependencies]
//! geocluster = { version = "0.1", features = ["sync"] }
//! ```
//!
//! ```rust
//! use geocluster::{ClusterOptions, GeoBounds, MarkerPoint, PointId, SyncSession};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = SyncSession::new(ClusterOptions::default().with_offload_threshold(1))?;
//!
//! let points: Vec<MarkerPoint> = (0..100)
//!     .map(|i| MarkerPoint::new(PointId::from(i), f64::from(i) * 0.01, 0.0))
//!     .collect();
//!
//! // Above the threshold the build runs on a worker thread
//! let outcome = session.set_points(points)?.wait()?;
//! assert!(outcome.installed);
//!
//! session.set_viewport(GeoBounds::world(), 0.0);
//! assert_eq!(session.get_visible().len(), 1);
//! # Ok(())
//! # }
//! ```

use super::{RebuildTicket, ViewportClusterSession};
use crate::config::ClusterOptions;
use crate::error::{ClusterError, Result};
use crate::index::{BuildStats, ClusterId, ClusterIndex, ClusterNode, Leaf};
use geocluster_types::bbox::GeoBounds;
use geocluster_types::point::MarkerPoint;
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Result of one rebuild request.
#[derive(Debug, Clone, PartialEq)]
pub struct RebuildOutcome {
    pub stats: BuildStats,
    /// False when a newer rebuild was requested before this one finished
    pub installed: bool,
}

/// A rebuild that either finished on the calling thread or is running on a
/// worker.
#[derive(Debug)]
pub enum PendingRebuild {
    Done(RebuildOutcome),
    Running(JoinHandle<Result<RebuildOutcome>>),
}

impl PendingRebuild {
    /// Block until the rebuild has finished and been installed or discarded.
    pub fn wait(self) -> Result<RebuildOutcome> {
        match self {
            PendingRebuild::Done(outcome) => Ok(outcome),
            PendingRebuild::Running(handle) => handle
                .join()
                .map_err(|_| ClusterError::Worker("rebuild thread panicked".to_string()))?,
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            PendingRebuild::Done(_) => true,
            PendingRebuild::Running(handle) => handle.is_finished(),
        }
    }
}

/// Thread-safe wrapper around [`ViewportClusterSession`].
///
/// Clones share the same session. Queries that only read the index take the
/// read lock; `get_visible` takes the write lock because it refreshes the
/// cached visible set.
#[derive(Debug, Clone)]
pub struct SyncSession {
    inner: Arc<RwLock<ViewportClusterSession>>,
}

impl SyncSession {
    pub fn new(options: ClusterOptions) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(RwLock::new(ViewportClusterSession::new(options)?)),
        })
    }

    pub fn from_session(session: ViewportClusterSession) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    /// Rebuild from `points`.
    ///
    /// Below `offload_threshold` points the build runs inline. Otherwise it
    /// runs on a spawned thread and the current index keeps answering
    /// queries until the new one is installed. A later call supersedes an
    /// earlier one still in flight.
    pub fn set_points(&self, points: Vec<MarkerPoint>) -> Result<PendingRebuild> {
        let (ticket, options) = {
            let mut session = self.inner.write();
            (session.begin_rebuild(), session.options().clone())
        };

        if points.len() < options.offload_threshold {
            return Ok(PendingRebuild::Done(self.build_and_install(
                ticket, points, options,
            )?));
        }

        log::debug!(
            "Offloading cluster build of {} points (rebuild {})",
            points.len(),
            ticket.sequence()
        );
        let worker = self.clone();
        let handle = thread::Builder::new()
            .name("geocluster-build".to_string())
            .spawn(move || worker.build_and_install(ticket, points, options))
            .map_err(|e| ClusterError::Worker(e.to_string()))?;
        Ok(PendingRebuild::Running(handle))
    }

    fn build_and_install(
        &self,
        ticket: RebuildTicket,
        points: Vec<MarkerPoint>,
        options: ClusterOptions,
    ) -> Result<RebuildOutcome> {
        let index = ClusterIndex::build(points, options)?;
        let stats = index.stats().clone();
        let installed = self.inner.write().finish_rebuild(ticket, index);
        Ok(RebuildOutcome { stats, installed })
    }

    pub fn set_options(&self, options: ClusterOptions) -> Result<()> {
        self.inner.write().set_options(options)
    }

    pub fn set_viewport(&self, bounds: GeoBounds, zoom: f64) {
        self.inner.write().set_viewport(bounds, zoom);
    }

    pub fn get_visible(&self) -> Vec<ClusterNode> {
        self.inner.write().get_visible().to_vec()
    }

    pub fn expand_to_bounds(&self, id: ClusterId) -> Result<GeoBounds> {
        self.inner.read().expand_to_bounds(id)
    }

    pub fn get_children(&self, id: ClusterId) -> Result<Vec<ClusterNode>> {
        self.inner.read().get_children(id)
    }

    pub fn get_leaves(&self, id: ClusterId, limit: Option<usize>, offset: usize) -> Result<Vec<Leaf>> {
        self.inner.read().get_leaves(id, limit, offset)
    }

    pub fn get_cluster_expansion_zoom(&self, id: ClusterId) -> Result<u8> {
        self.inner.read().get_cluster_expansion_zoom(id)
    }

    pub fn version(&self) -> u64 {
        self.inner.read().version()
    }

    /// Snapshot of the index currently serving queries.
    pub fn index(&self) -> Option<Arc<ClusterIndex>> {
        self.inner.read().index().cloned()
    }
}
