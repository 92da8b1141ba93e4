use geo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// A geographic rectangle given by its west/south/east/north edges in degrees.
///
/// When `west > east` the rectangle crosses the antimeridian: it spans from
/// `west` eastwards through 180° to `east`. A rectangle whose `south` is
/// greater than its `north` is empty; see [`GeoBounds::empty`].
///
/// # Examples
///
/// ```
/// use geocluster_types::bbox::GeoBounds;
/// use geo::Point;
///
/// // Pacific view straddling the date line
/// let pacific = GeoBounds::new(170.0, -10.0, -170.0, 10.0);
/// assert!(pacific.crosses_antimeridian());
/// assert!(pacific.contains(&Point::new(179.5, 0.0)));
/// assert!(pacific.contains(&Point::new(-175.0, 0.0)));
/// assert!(!pacific.contains(&Point::new(0.0, 0.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoBounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// The whole world.
    pub fn world() -> Self {
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }

    /// A degenerate rectangle that contains nothing and grows on [`extend`](Self::extend).
    pub fn empty() -> Self {
        Self {
            west: f64::INFINITY,
            south: f64::INFINITY,
            east: f64::NEG_INFINITY,
            north: f64::NEG_INFINITY,
        }
    }

    /// True when no point has been added to an [`empty`](Self::empty) rectangle,
    /// or when the edges are otherwise unusable for fitting a camera.
    pub fn is_empty(&self) -> bool {
        !(self.south.is_finite()
            && self.north.is_finite()
            && self.west.is_finite()
            && self.east.is_finite())
            || self.south > self.north
    }

    /// Minimal rectangle containing every point, without antimeridian wrapping.
    ///
    /// Returns [`GeoBounds::empty`] for an empty iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point<f64>>) -> Self {
        let mut bounds = Self::empty();
        for point in points {
            bounds.extend(point);
        }
        bounds
    }

    /// Grow the rectangle to include `point`. Never produces a wrapped rectangle.
    pub fn extend(&mut self, point: &Point<f64>) {
        self.west = self.west.min(point.x());
        self.east = self.east.max(point.x());
        self.south = self.south.min(point.y());
        self.north = self.north.max(point.y());
    }

    pub fn crosses_antimeridian(&self) -> bool {
        !self.is_empty() && self.west > self.east
    }

    /// Longitudinal span in degrees, accounting for antimeridian wrapping.
    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else if self.crosses_antimeridian() {
            self.east + 360.0 - self.west
        } else {
            self.east - self.west
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.north - self.south
        }
    }

    pub fn contains(&self, point: &Point<f64>) -> bool {
        if self.is_empty() || point.y() < self.south || point.y() > self.north {
            return false;
        }
        if self.crosses_antimeridian() {
            point.x() >= self.west || point.x() <= self.east
        } else {
            point.x() >= self.west && point.x() <= self.east
        }
    }

    /// Convert to a `geo::Rect`. `None` for empty or antimeridian-crossing bounds.
    pub fn to_rect(&self) -> Option<Rect<f64>> {
        if self.is_empty() || self.crosses_antimeridian() {
            return None;
        }
        Some(Rect::new(
            geo::coord! { x: self.west, y: self.south },
            geo::coord! { x: self.east, y: self.north },
        ))
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::world()
    }
}

impl From<Rect<f64>> for GeoBounds {
    fn from(rect: Rect<f64>) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}
