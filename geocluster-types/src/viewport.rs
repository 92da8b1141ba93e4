use crate::bbox::GeoBounds;
use serde::{Deserialize, Serialize};

/// The visible part of the map: a geographic rectangle plus the camera zoom.
///
/// Zoom may be fractional while the camera animates; the clustering engine
/// floors it when choosing a level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub bounds: GeoBounds,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(bounds: GeoBounds, zoom: f64) -> Self {
        Self { bounds, zoom }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            bounds: GeoBounds::world(),
            zoom: 0.0,
        }
    }
}
