//! GeoJSON import of point records and export of clustered features.
//!
//! Exported aggregates carry the properties map renderers expect:
//! `cluster`, `cluster_id`, `point_count` and `point_count_abbreviated`.

use crate::compute::validation::RawPoint;
use crate::error::Result;
use crate::index::{Aggregate, ClusterNode, Leaf};
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use geocluster_types::point::PointId;

/// Parse a GeoJSON `FeatureCollection` document.
pub fn parse_feature_collection(json: &str) -> Result<FeatureCollection> {
    Ok(serde_json::from_str(json)?)
}

/// Turn the `Point` features of a collection into raw records.
///
/// Features without a `Point` geometry are skipped. A feature without an id
/// gets the string id `feature-<position>`, which cannot collide with a
/// numeric id. Coordinates are not validated here; that happens when the
/// records are indexed.
///
/// ```rust
/// use geocluster::geojson::{parse_feature_collection, points_from_feature_collection};
///
/// let fc = parse_feature_collection(r#"{
///     "type": "FeatureCollection",
///     "features": [
///         { "type": "Feature", "id": "a",
///           "geometry": { "type": "Point", "coordinates": [2.35, 48.85] },
///           "properties": { "name": "Paris" } },
///         { "type": "Feature",
///           "geometry": { "type": "LineString", "coordinates": [[0, 0], [1, 1]] },
///           "properties": null }
///     ]
/// }"#)?;
///
/// let records = points_from_feature_collection(&fc);
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].longitude, Some(2.35));
/// # Ok::<(), geocluster::ClusterError>(())
/// ```
pub fn points_from_feature_collection(collection: &FeatureCollection) -> Vec<RawPoint> {
    let mut records = Vec::with_capacity(collection.features.len());
    let mut skipped = 0;

    for (position, feature) in collection.features.iter().enumerate() {
        let Some(Value::Point(coords)) = feature.geometry.as_ref().map(|g| &g.value) else {
            skipped += 1;
            continue;
        };

        let id = match &feature.id {
            Some(Id::String(s)) => PointId::String(s.clone()),
            Some(Id::Number(n)) => match n.as_i64() {
                Some(n) => PointId::Number(n),
                None => PointId::String(n.to_string()),
            },
            None => PointId::String(format!("feature-{}", position)),
        };

        records.push(RawPoint {
            id,
            longitude: coords.first().copied(),
            latitude: coords.get(1).copied(),
            properties: feature.properties.clone().unwrap_or_default(),
        });
    }

    if skipped > 0 {
        log::debug!("Skipped {} GeoJSON features without a Point geometry", skipped);
    }
    records
}

/// Render query results as a `FeatureCollection`.
pub fn nodes_to_feature_collection(nodes: &[ClusterNode]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: nodes.iter().map(node_to_feature).collect(),
        foreign_members: None,
    }
}

pub fn node_to_feature(node: &ClusterNode) -> Feature {
    match node {
        ClusterNode::Leaf(leaf) => leaf_feature(leaf),
        ClusterNode::Aggregate(aggregate) => aggregate_feature(aggregate),
    }
}

fn point_geometry(x: f64, y: f64) -> Option<Geometry> {
    Some(Geometry::new(Value::Point(vec![x, y])))
}

fn leaf_feature(leaf: &Leaf) -> Feature {
    let id = match &leaf.point.id {
        PointId::Number(n) => Id::Number((*n).into()),
        PointId::String(s) => Id::String(s.clone()),
    };
    Feature {
        bbox: None,
        geometry: point_geometry(leaf.point.longitude(), leaf.point.latitude()),
        id: Some(id),
        properties: Some(leaf.point.properties.clone()),
        foreign_members: None,
    }
}

fn aggregate_feature(aggregate: &Aggregate) -> Feature {
    let raw_id = aggregate.id.as_u64();

    // small counts stay numeric, larger ones become labels like "1.2k"
    let abbreviated = if aggregate.point_count >= 1000 {
        serde_json::Value::from(aggregate.abbreviated_count())
    } else {
        serde_json::Value::from(aggregate.point_count)
    };

    let mut properties = JsonObject::new();
    properties.insert("cluster".to_string(), true.into());
    properties.insert("cluster_id".to_string(), raw_id.into());
    properties.insert("point_count".to_string(), aggregate.point_count.into());
    properties.insert("point_count_abbreviated".to_string(), abbreviated);

    Feature {
        bbox: None,
        geometry: point_geometry(aggregate.position.x(), aggregate.position.y()),
        id: Some(Id::Number(raw_id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}
