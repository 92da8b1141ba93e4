//! Hierarchical point clustering for interactive maps.
//!
//! Nearby markers are merged into cluster markers per zoom level, and the
//! clusters split apart again as the map zooms in. A [`ClusterIndex`] is
//! built once per point set and answers viewport queries and cluster
//! drill-down; a [`ViewportClusterSession`] holds the index for one map view
//! together with its current viewport.
//!
//! ```rust
//! use geocluster::{ClusterOptions, GeoBounds, MarkerPoint, PointId, ViewportClusterSession};
//!
//! let mut session = ViewportClusterSession::new(ClusterOptions::default())?;
//! session.set_points(vec![
//!     MarkerPoint::new(PointId::from(1), -74.0060, 40.7128),
//!     MarkerPoint::new(PointId::from(2), -73.9857, 40.7484),
//!     MarkerPoint::new(PointId::from(3), 2.3522, 48.8566),
//! ])?;
//!
//! session.set_viewport(GeoBounds::world(), 2.0);
//! let visible = session.get_visible().to_vec();
//! assert_eq!(visible.len(), 2);
//!
//! let new_york = visible.iter().find(|n| n.is_cluster()).unwrap();
//! let id = new_york.cluster_id().unwrap();
//! let zoom = session.get_cluster_expansion_zoom(id)?;
//! assert!(zoom > 2);
//! # Ok::<(), geocluster::ClusterError>(())
//! ```

pub mod compute;
pub mod config;
pub mod error;
pub mod index;
pub mod session;

#[cfg(feature = "geojson")]
pub mod geojson;

pub use config::{CentroidPolicy, ClusterOptions};
pub use error::{ClusterError, Result};
pub use index::{Aggregate, BuildStats, ClusterId, ClusterIndex, ClusterNode, Leaf};
pub use session::{RebuildTicket, ViewportClusterSession};

#[cfg(feature = "sync")]
pub use session::sync::{PendingRebuild, RebuildOutcome, SyncSession};

pub use compute::validation::RawPoint;

pub use geocluster_types::bbox::GeoBounds;
pub use geocluster_types::point::{MarkerPoint, PointId, Properties};
pub use geocluster_types::viewport::Viewport;

pub use geo::Point;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{ClusterError, ClusterOptions, Result};

    pub use crate::{ClusterId, ClusterIndex, ClusterNode, ViewportClusterSession};

    pub use crate::{GeoBounds, MarkerPoint, PointId, RawPoint};

    #[cfg(feature = "sync")]
    pub use crate::SyncSession;

    pub use geo::Point;
}
