//! Clustering options.
//!
//! Options are plain serializable data so they can live next to the rest of a
//! map's configuration in JSON (or TOML with the `toml` feature).

use crate::error::{ClusterError, Result};
use serde::{Deserialize, Serialize};

/// Highest zoom the engine accepts for `max_zoom`. Level math uses `2^zoom`
/// and the leaf level sits at `max_zoom + 1`.
pub const MAX_SUPPORTED_ZOOM: u8 = 30;

/// How the position of a freshly merged aggregate is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CentroidPolicy {
    /// Point-count weighted mean of the merged features in projected space
    #[default]
    Weighted,
    /// Position of the feature that seeded the merge
    FirstPoint,
}

/// Tunables for building a [`ClusterIndex`](crate::ClusterIndex) and querying it.
///
/// # Example
///
/// ```rust
/// use geocluster::ClusterOptions;
///
/// let options = ClusterOptions::default();
/// assert_eq!(options.radius, 64.0);
///
/// let json = r#"{ "radius": 40.0, "max_zoom": 16 }"#;
/// let options = ClusterOptions::from_json(json).unwrap();
/// assert_eq!(options.max_zoom, 16);
/// assert_eq!(options.extent, 256.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterOptions {
    /// Coarsest zoom at which clusters are generated
    #[serde(default)]
    pub min_zoom: u8,

    /// Finest zoom at which points are still merged; above it every point
    /// renders individually
    #[serde(default = "ClusterOptions::default_max_zoom")]
    pub max_zoom: u8,

    /// Minimum number of points that may form an aggregate
    #[serde(default = "ClusterOptions::default_min_points")]
    pub min_points: usize,

    /// Merge radius in tile pixels. Larger means fewer, bigger clusters.
    #[serde(default = "ClusterOptions::default_radius")]
    pub radius: f64,

    /// Tile resolution in pixels; the radius is relative to it. Smaller
    /// means more aggressive clustering.
    #[serde(default = "ClusterOptions::default_extent")]
    pub extent: f64,

    /// Screen-pixel margin added around the viewport when querying
    #[serde(default = "ClusterOptions::default_padding")]
    pub padding: f64,

    #[serde(default)]
    pub centroid: CentroidPolicy,

    /// Point count above which a synchronized session builds on a worker thread
    #[serde(default = "ClusterOptions::default_offload_threshold")]
    pub offload_threshold: usize,
}

impl ClusterOptions {
    const fn default_max_zoom() -> u8 {
        12
    }

    const fn default_min_points() -> usize {
        2
    }

    const fn default_radius() -> f64 {
        64.0
    }

    const fn default_extent() -> f64 {
        256.0
    }

    const fn default_padding() -> f64 {
        100.0
    }

    const fn default_offload_threshold() -> usize {
        5_000
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_extent(mut self, extent: f64) -> Self {
        self.extent = extent;
        self
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_centroid(mut self, centroid: CentroidPolicy) -> Self {
        self.centroid = centroid;
        self
    }

    pub fn with_offload_threshold(mut self, threshold: usize) -> Self {
        self.offload_threshold = threshold;
        self
    }

    /// Merge distance at `zoom`, in unit-square (projected) coordinates.
    pub fn radius_at(&self, zoom: u8) -> f64 {
        self.radius / (self.extent * 2f64.powi(i32::from(zoom)))
    }

    /// Validate option values. Called by every build.
    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(ClusterError::InvalidConfig(format!(
                "Cluster radius must be a positive finite number, got: {}",
                self.radius
            )));
        }

        if !self.extent.is_finite() || self.extent <= 0.0 {
            return Err(ClusterError::InvalidConfig(format!(
                "Tile extent must be a positive finite number, got: {}",
                self.extent
            )));
        }

        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(ClusterError::InvalidConfig(format!(
                "Query padding must be finite and non-negative, got: {}",
                self.padding
            )));
        }

        if self.min_points < 2 {
            return Err(ClusterError::InvalidConfig(format!(
                "Minimum points per cluster must be at least 2, got: {}",
                self.min_points
            )));
        }

        if self.max_zoom > MAX_SUPPORTED_ZOOM {
            return Err(ClusterError::InvalidConfig(format!(
                "Max zoom must be at most {}, got: {}",
                MAX_SUPPORTED_ZOOM, self.max_zoom
            )));
        }

        if self.min_zoom > self.max_zoom {
            return Err(ClusterError::InvalidConfig(format!(
                "Min zoom ({}) must not exceed max zoom ({})",
                self.min_zoom, self.max_zoom
            )));
        }

        Ok(())
    }

    /// Load options from a JSON string and validate them.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: ClusterOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load options from a TOML string and validate them (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let options: ClusterOptions =
            toml::from_str(toml_str).map_err(|e| ClusterError::Toml(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ClusterError::Toml(e.to_string()))
    }
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            min_zoom: 0,
            max_zoom: Self::default_max_zoom(),
            min_points: Self::default_min_points(),
            radius: Self::default_radius(),
            extent: Self::default_extent(),
            padding: Self::default_padding(),
            centroid: CentroidPolicy::default(),
            offload_threshold: Self::default_offload_threshold(),
        }
    }
}
