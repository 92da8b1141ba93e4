//! Spherical Mercator projection into the unit square.
//!
//! Clustering works in a projected space where the whole world is the square
//! `[0, 1] x [0, 1]`: x grows eastwards from the antimeridian, y grows
//! southwards from the top edge of the Mercator map. At zoom `z` one unit
//! spans `2^z` tiles, so pixel distances convert to unit distances by
//! dividing by `tile_size * 2^z`.

use std::f64::consts::PI;

/// Tile size in screen pixels assumed for viewport padding.
pub const SCREEN_TILE_SIZE: f64 = 256.0;

/// Longitude in degrees to projected x in `[0, 1]` (unclamped outside ±180°).
#[inline]
pub fn lng_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Latitude in degrees to projected y, clamped to `[0, 1]`.
///
/// The poles map onto the square's edges rather than to infinity.
#[inline]
pub fn lat_y(lat: f64) -> f64 {
    let sin = lat.to_radians().sin();
    let y = 0.5 - (0.25 * ((1.0 + sin) / (1.0 - sin)).ln()) / PI;
    y.clamp(0.0, 1.0)
}

/// Projected x back to longitude in degrees.
#[inline]
pub fn x_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

/// Projected y back to latitude in degrees.
#[inline]
pub fn y_lat(y: f64) -> f64 {
    let y2 = ((180.0 - y * 360.0) * PI) / 180.0;
    (360.0 * y2.exp().atan()) / PI - 90.0
}

/// Screen pixels to unit-square distance at a (possibly fractional) zoom.
#[inline]
pub fn pixels_to_unit(pixels: f64, zoom: f64) -> f64 {
    pixels / (SCREEN_TILE_SIZE * zoom.exp2())
}
