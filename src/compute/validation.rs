//! Validation and normalization of incoming point records.
//!
//! Invalid records never reach the index: they are dropped here and only
//! counted, so a bad row from the point source cannot break a build.

use crate::error::{ClusterError, Result};
use geo::Point;
use geocluster_types::point::{MarkerPoint, PointId, Properties};
use serde::{Deserialize, Serialize};

/// A record as delivered by the point source, before validation.
///
/// Coordinates are optional so that rows with missing or `null` positions can
/// be deserialized and then dropped instead of failing the whole payload.
///
/// # Examples
///
/// ```
/// use geocluster::compute::validation::RawPoint;
///
/// let rows: Vec<RawPoint> = serde_json::from_str(r#"[
///     { "id": 1, "lat": 40.7128, "lon": -74.0060, "properties": { "name": "NYC" } },
///     { "id": 2, "lat": null, "lon": 2.35 }
/// ]"#).unwrap();
///
/// assert_eq!(rows[0].latitude, Some(40.7128));
/// assert_eq!(rows[1].latitude, None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub id: PointId,
    #[serde(default, alias = "lon", alias = "lng")]
    pub longitude: Option<f64>,
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub properties: Properties,
}

impl RawPoint {
    pub fn new(id: impl Into<PointId>, longitude: f64, latitude: f64) -> Self {
        Self {
            id: id.into(),
            longitude: Some(longitude),
            latitude: Some(latitude),
            properties: Properties::new(),
        }
    }
}

impl TryFrom<RawPoint> for MarkerPoint {
    type Error = ClusterError;

    fn try_from(raw: RawPoint) -> Result<Self> {
        let (Some(longitude), Some(latitude)) = (raw.longitude, raw.latitude) else {
            return Err(ClusterError::InvalidPoint(format!(
                "Point {} is missing a coordinate",
                raw.id
            )));
        };

        let marker = MarkerPoint::new(raw.id, longitude, latitude).with_properties(raw.properties);
        validate_marker(&marker)?;
        Ok(marker)
    }
}

/// Validates a 2D point has valid longitude and latitude.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use geocluster::compute::validation::validate_geographic_point;
/// use geo::Point;
///
/// assert!(validate_geographic_point(&Point::new(-74.0060, 40.7128)).is_ok());
/// assert!(validate_geographic_point(&Point::new(200.0, 40.0)).is_err());
/// assert!(validate_geographic_point(&Point::new(-74.0, 95.0)).is_err());
/// assert!(validate_geographic_point(&Point::new(f64::NAN, 0.0)).is_err());
/// ```
pub fn validate_geographic_point(point: &Point) -> Result<()> {
    let (x, y) = (point.x(), point.y());

    if !x.is_finite() {
        return Err(ClusterError::InvalidPoint(format!(
            "Longitude must be finite, got: {}",
            x
        )));
    }

    if !y.is_finite() {
        return Err(ClusterError::InvalidPoint(format!(
            "Latitude must be finite, got: {}",
            y
        )));
    }

    if !(-180.0..=180.0).contains(&x) {
        return Err(ClusterError::InvalidPoint(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            x
        )));
    }

    if !(-90.0..=90.0).contains(&y) {
        return Err(ClusterError::InvalidPoint(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            y
        )));
    }

    Ok(())
}

pub fn validate_marker(marker: &MarkerPoint) -> Result<()> {
    validate_geographic_point(marker.position())
        .map_err(|e| ClusterError::InvalidPoint(format!("Point {}: {}", marker.id, e)))
}

/// Keep the valid markers, in input order, and count the dropped ones.
pub fn retain_valid(points: impl IntoIterator<Item = MarkerPoint>) -> (Vec<MarkerPoint>, usize) {
    let mut dropped = 0;
    let valid = points
        .into_iter()
        .filter(|marker| match validate_marker(marker) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Dropping point from cluster input: {}", e);
                dropped += 1;
                false
            }
        })
        .collect();
    (valid, dropped)
}

/// Convert raw source rows into markers, dropping rows that fail validation.
pub fn normalize_points(raw: impl IntoIterator<Item = RawPoint>) -> (Vec<MarkerPoint>, usize) {
    let mut dropped = 0;
    let markers = raw
        .into_iter()
        .filter_map(|row| match MarkerPoint::try_from(row) {
            Ok(marker) => Some(marker),
            Err(e) => {
                log::warn!("Dropping raw point record: {}", e);
                dropped += 1;
                None
            }
        })
        .collect();
    (markers, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_geographic_point() {
        let nyc = Point::new(-74.0060, 40.7128);
        assert!(validate_geographic_point(&nyc).is_ok());

        // Edge cases
        assert!(validate_geographic_point(&Point::new(180.0, 0.0)).is_ok());
        assert!(validate_geographic_point(&Point::new(-180.0, 0.0)).is_ok());
        assert!(validate_geographic_point(&Point::new(0.0, 90.0)).is_ok());
        assert!(validate_geographic_point(&Point::new(0.0, -90.0)).is_ok());
    }

    #[test]
    fn test_invalid_geographic_point() {
        assert!(validate_geographic_point(&Point::new(180.0001, 0.0)).is_err());
        assert!(validate_geographic_point(&Point::new(0.0, -90.5)).is_err());
        assert!(validate_geographic_point(&Point::new(f64::INFINITY, 0.0)).is_err());
        assert!(validate_geographic_point(&Point::new(0.0, f64::NAN)).is_err());
    }

    #[test]
    fn test_retain_valid_keeps_order() {
        let points = vec![
            MarkerPoint::new(PointId::from(1), 1.0, 1.0),
            MarkerPoint::new(PointId::from(2), 500.0, 1.0),
            MarkerPoint::new(PointId::from(3), 3.0, 3.0),
            MarkerPoint::new(PointId::from(4), 0.0, f64::NAN),
        ];
        let (valid, dropped) = retain_valid(points);
        assert_eq!(dropped, 2);
        let ids: Vec<_> = valid.iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids, vec![PointId::from(1), PointId::from(3)]);
    }

    #[test]
    fn test_normalize_drops_missing_coordinates() {
        let mut missing = RawPoint::new(2, 0.0, 0.0);
        missing.latitude = None;

        let rows = vec![RawPoint::new(1, 10.0, 20.0), missing, RawPoint::new(3, 0.0, 91.0)];
        let (markers, dropped) = normalize_points(rows);
        assert_eq!(markers.len(), 1);
        assert_eq!(dropped, 2);
        assert_eq!(markers[0].longitude(), 10.0);
        assert_eq!(markers[0].latitude(), 20.0);
    }

    #[test]
    fn test_raw_point_try_from_error_kind() {
        let mut row = RawPoint::new("a", 0.0, 0.0);
        row.longitude = None;
        assert!(matches!(
            MarkerPoint::try_from(row),
            Err(ClusterError::InvalidPoint(_))
        ));
    }
}
