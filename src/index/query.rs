//! Viewport queries.

use super::{ClusterIndex, ClusterNode};
use crate::compute::projection::{lat_y, lng_x, pixels_to_unit};
use crate::config::MAX_SUPPORTED_ZOOM;
use geocluster_types::bbox::GeoBounds;

/// A closed x-range in projected space, never wrapping.
type XRange = (f64, f64);

/// Split the longitudinal extent of a padded query into at most two
/// non-wrapping projected ranges.
fn x_ranges(west: f64, east: f64, pad: f64) -> Vec<XRange> {
    let east = if west > east { east + 360.0 } else { east };
    let min_x = lng_x(west) - pad;
    let max_x = lng_x(east) + pad;

    if max_x - min_x >= 1.0 {
        return vec![(0.0, 1.0)];
    }

    let mut start = min_x.rem_euclid(1.0);
    if start == 0.0 && min_x >= 1.0 {
        // longitude 180 is stored at x = 1, not folded onto x = 0
        start = 1.0;
    }
    let end = start + (max_x - min_x);
    if end <= 1.0 {
        vec![(start, end)]
    } else {
        vec![(start, 1.0), (0.0, end - 1.0)]
    }
}

impl ClusterIndex {
    /// Features visible in `bounds` at `zoom`, without padding.
    pub fn query(&self, bounds: &GeoBounds, zoom: f64) -> Vec<ClusterNode> {
        self.query_padded(bounds, zoom, 0.0)
    }

    /// Features visible in `bounds` at `zoom`, with the rectangle grown by
    /// `padding` screen pixels on every side.
    ///
    /// The level is `floor(zoom)` clamped to `min_zoom..=max_zoom + 1`.
    /// Bounds with `west > east` wrap across the antimeridian. Results are
    /// ordered by their position in the level, so identical inputs always
    /// yield identical output.
    pub fn query_padded(&self, bounds: &GeoBounds, zoom: f64, padding: f64) -> Vec<ClusterNode> {
        if self.is_empty() {
            return Vec::new();
        }
        if bounds.is_empty() {
            log::warn!("Rejecting cluster query with empty or non-finite bounds");
            return Vec::new();
        }

        let level = self.level(self.level_zoom(zoom));

        let pad_zoom = if zoom.is_finite() {
            zoom.clamp(0.0, f64::from(MAX_SUPPORTED_ZOOM) + 1.0)
        } else {
            f64::from(self.options.min_zoom)
        };
        let pad = if padding.is_finite() && padding > 0.0 {
            pixels_to_unit(padding, pad_zoom)
        } else {
            0.0
        };

        let min_y = lat_y(bounds.north.clamp(-90.0, 90.0)) - pad;
        let max_y = lat_y(bounds.south.clamp(-90.0, 90.0)) + pad;

        let mut ordinals: Vec<u32> = x_ranges(bounds.west, bounds.east, pad)
            .into_iter()
            .flat_map(|(min_x, max_x)| level.tree.range(min_x, min_y, max_x, max_y))
            .collect();
        ordinals.sort_unstable();
        ordinals.dedup();

        ordinals
            .into_iter()
            .map(|ordinal| self.to_cluster_node(level.nodes[ordinal as usize]))
            .collect()
    }
}
