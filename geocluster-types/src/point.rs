use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque key-value payload carried by a marker (a display name, a category...).
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Stable identifier of an input point.
///
/// Serializes untagged so that it round-trips through a GeoJSON feature `id`,
/// which may be either a number or a string.
///
/// # Examples
///
/// ```
/// use geocluster_types::point::PointId;
///
/// let numeric: PointId = serde_json::from_str("42").unwrap();
/// assert_eq!(numeric, PointId::Number(42));
///
/// let named: PointId = serde_json::from_str("\"station-9\"").unwrap();
/// assert_eq!(named, PointId::from("station-9"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Number(i64),
    String(String),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Number(n) => write!(f, "{}", n),
            PointId::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PointId {
    fn from(value: i64) -> Self {
        PointId::Number(value)
    }
}

impl From<i32> for PointId {
    fn from(value: i32) -> Self {
        PointId::Number(i64::from(value))
    }
}

impl From<u32> for PointId {
    fn from(value: u32) -> Self {
        PointId::Number(i64::from(value))
    }
}

impl From<&str> for PointId {
    fn from(value: &str) -> Self {
        PointId::String(value.to_string())
    }
}

impl From<String> for PointId {
    fn from(value: String) -> Self {
        PointId::String(value)
    }
}

/// A validated input record: one marker on the map.
///
/// The position is stored as a `geo::Point` with x = longitude and
/// y = latitude, both in degrees.
///
/// # Examples
///
/// ```
/// use geocluster_types::point::{MarkerPoint, PointId};
///
/// let marker = MarkerPoint::new(PointId::from(1), -74.0060, 40.7128)
///     .with_property("name", "NYC");
///
/// assert_eq!(marker.longitude(), -74.0060);
/// assert_eq!(marker.latitude(), 40.7128);
/// assert_eq!(marker.properties["name"], "NYC");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerPoint {
    /// Caller-supplied identifier
    pub id: PointId,
    /// Longitude (x) and latitude (y) in degrees
    pub position: Point<f64>,
    /// Opaque payload handed back untouched with the leaf
    #[serde(default)]
    pub properties: Properties,
}

impl MarkerPoint {
    /// Create a marker with no properties.
    pub fn new(id: PointId, longitude: f64, latitude: f64) -> Self {
        Self {
            id,
            position: Point::new(longitude, latitude),
            properties: Properties::new(),
        }
    }

    /// Attach a single property, replacing any previous value under `key`.
    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Replace the whole property map.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    pub fn longitude(&self) -> f64 {
        self.position.x()
    }

    pub fn latitude(&self) -> f64 {
        self.position.y()
    }

    pub fn position(&self) -> &Point<f64> {
        &self.position
    }
}
