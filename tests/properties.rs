use geocluster::compute::projection::{lat_y, lng_x};
use geocluster::{ClusterIndex, ClusterNode, ClusterOptions, GeoBounds, MarkerPoint, PointId};
use quickcheck::{QuickCheck, TestResult};

/// Map arbitrary integers onto a regional patch so that clusters actually form.
fn points_from(raw: &[(u16, u16)]) -> Vec<MarkerPoint> {
    raw.iter()
        .enumerate()
        .map(|(i, &(a, b))| {
            let lng = -20.0 + f64::from(a) / f64::from(u16::MAX) * 40.0;
            let lat = -20.0 + f64::from(b) / f64::from(u16::MAX) * 40.0;
            MarkerPoint::new(PointId::Number(i as i64), lng, lat)
        })
        .collect()
}

fn counts_add_up(raw: Vec<(u16, u16)>, zoom: u8) -> TestResult {
    let zoom = f64::from(zoom % 14);
    let points = points_from(&raw);
    let Ok(index) = ClusterIndex::build(points, ClusterOptions::default()) else {
        return TestResult::failed();
    };

    let nodes = index.query(&GeoBounds::world(), zoom);
    let total: usize = nodes.iter().map(ClusterNode::point_count).sum();
    TestResult::from_bool(total == raw.len())
}

fn leaves_stay_near_their_cluster(raw: Vec<(u16, u16)>, zoom: u8) -> TestResult {
    if raw.len() < 2 {
        return TestResult::discard();
    }
    let options = ClusterOptions::default();
    let points = points_from(&raw);
    let Ok(index) = ClusterIndex::build(points, options.clone()) else {
        return TestResult::failed();
    };

    for node in index.query(&GeoBounds::world(), f64::from(zoom % 13)) {
        let Some(cluster) = node.as_aggregate() else {
            continue;
        };
        let cx = lng_x(cluster.position.x());
        let cy = lat_y(cluster.position.y());
        // each level moves a member at most two radii from its centroid and
        // finer radii halve, so the whole chain stays within four
        let limit = 4.0 * options.radius_at(cluster.zoom) + 1e-9;

        let Ok(leaves) = index.get_leaves(cluster.id, None, 0) else {
            return TestResult::failed();
        };
        if leaves.len() != cluster.point_count {
            return TestResult::failed();
        }
        for leaf in leaves {
            let dx = lng_x(leaf.point.longitude()) - cx;
            let dy = lat_y(leaf.point.latitude()) - cy;
            if (dx * dx + dy * dy).sqrt() > limit {
                return TestResult::failed();
            }
        }
    }
    TestResult::passed()
}

fn queries_are_idempotent(raw: Vec<(u16, u16)>, zoom: u8) -> TestResult {
    let points = points_from(&raw);
    let Ok(index) = ClusterIndex::build(points, ClusterOptions::default()) else {
        return TestResult::failed();
    };
    let bounds = GeoBounds::new(-10.0, -10.0, 10.0, 10.0);
    let zoom = f64::from(zoom % 16);
    TestResult::from_bool(index.query(&bounds, zoom) == index.query(&bounds, zoom))
}

#[test]
fn prop_counts_add_up() {
    QuickCheck::new()
        .tests(200)
        .quickcheck(counts_add_up as fn(Vec<(u16, u16)>, u8) -> TestResult);
}

#[test]
fn prop_leaves_stay_near_their_cluster() {
    QuickCheck::new()
        .tests(200)
        .quickcheck(leaves_stay_near_their_cluster as fn(Vec<(u16, u16)>, u8) -> TestResult);
}

#[test]
fn prop_queries_are_idempotent() {
    QuickCheck::new()
        .tests(100)
        .quickcheck(queries_are_idempotent as fn(Vec<(u16, u16)>, u8) -> TestResult);
}
