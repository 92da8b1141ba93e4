use geocluster::{
    ClusterIndex, ClusterNode, ClusterOptions, GeoBounds, MarkerPoint, PointId,
    ViewportClusterSession,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn marker(id: i64, lng: f64, lat: f64) -> MarkerPoint {
    MarkerPoint::new(PointId::Number(id), lng, lat)
}

fn total_count(nodes: &[ClusterNode]) -> usize {
    nodes.iter().map(ClusterNode::point_count).sum()
}

/// Scenario A: two near-identical points cluster, the distant one stays alone
#[test]
fn test_close_pair_clusters_at_world_zoom() {
    init_logging();
    let options = ClusterOptions::default()
        .with_radius(40.0)
        .with_max_zoom(15);
    let index = ClusterIndex::build(
        vec![
            marker(1, 0.0, 0.0),
            marker(2, 0.0, 0.0001),
            marker(3, 50.0, 50.0),
        ],
        options,
    )
    .expect("build failed");

    let world = index.query(&GeoBounds::world(), 0.0);
    assert_eq!(world.len(), 2);

    let cluster = world
        .iter()
        .find_map(ClusterNode::as_aggregate)
        .expect("no cluster at zoom 0");
    assert_eq!(cluster.point_count, 2);

    let single = world
        .iter()
        .find_map(ClusterNode::as_leaf)
        .expect("no leaf at zoom 0");
    assert_eq!(single.point.id, PointId::Number(3));

    // past max_zoom everything renders individually
    let street = index.query(&GeoBounds::world(), 16.0);
    assert_eq!(street.len(), 3);
    assert!(street.iter().all(|n| !n.is_cluster()));
}

/// Scenario B: expansion zoom is one past the zoom where the merge happened
#[test]
fn test_expansion_zoom_reveals_children() {
    init_logging();
    let index = ClusterIndex::build(
        vec![marker(1, 0.0, 0.0), marker(2, 0.5, 0.0)],
        ClusterOptions::default(),
    )
    .expect("build failed");

    let at_five = index.query(&GeoBounds::world(), 5.0);
    assert_eq!(at_five.len(), 1);
    let id = at_five[0].cluster_id().expect("expected a cluster");

    let zoom = index.get_cluster_expansion_zoom(id).expect("lookup failed");
    assert_eq!(zoom, 8);
    assert_eq!(index.query(&GeoBounds::world(), f64::from(zoom)).len(), 2);
    assert_eq!(index.query(&GeoBounds::world(), f64::from(zoom - 1)).len(), 1);
}

/// Scenario C: expanding a cluster yields the exact envelope of its leaves
#[test]
fn test_expand_to_bounds_fits_leaves_exactly() {
    init_logging();
    let mut session = ViewportClusterSession::new(ClusterOptions::default()).expect("session");
    session
        .set_points(vec![marker(1, 10.0, 10.0), marker(2, 20.0, 20.0)])
        .expect("set_points failed");
    session.set_viewport(GeoBounds::world(), 1.0);

    let id = session.get_visible()[0]
        .cluster_id()
        .expect("expected a cluster");
    let bounds = session.expand_to_bounds(id).expect("expand failed");
    assert_eq!(bounds, GeoBounds::new(10.0, 10.0, 20.0, 20.0));
    assert!(!bounds.is_empty());
}

#[test]
fn test_world_counts_add_up_at_every_zoom() {
    let points: Vec<MarkerPoint> = (0..2_000)
        .map(|i| {
            let t = i as f64;
            marker(
                i,
                -170.0 + (t * 0.618_034).fract() * 340.0,
                -80.0 + (t * 0.414_214).fract() * 160.0,
            )
        })
        .collect();
    let index = ClusterIndex::build(points, ClusterOptions::default()).expect("build failed");

    let mut previous = 0;
    for zoom in 0..=13 {
        let nodes = index.query(&GeoBounds::world(), f64::from(zoom));
        assert_eq!(total_count(&nodes), 2_000, "zoom {}", zoom);
        // zooming in never reduces the number of markers
        assert!(nodes.len() >= previous, "zoom {}", zoom);
        previous = nodes.len();
    }
    assert_eq!(previous, 2_000);
}

#[test]
fn test_repeated_queries_are_identical() {
    let points: Vec<MarkerPoint> = (0..500)
        .map(|i| marker(i, (i % 50) as f64 * 0.2, (i / 50) as f64 * 0.2))
        .collect();
    let index = ClusterIndex::build(points, ClusterOptions::default()).expect("build failed");
    let bounds = GeoBounds::new(-1.0, -1.0, 5.0, 5.0);

    for zoom in [3.0, 6.5, 9.0] {
        let first = index.query(&bounds, zoom);
        let second = index.query(&bounds, zoom);
        assert_eq!(first, second);
    }
}

#[test]
fn test_same_input_gives_same_shape() {
    let points: Vec<MarkerPoint> = (0..300)
        .map(|i| marker(i, (i as f64 * 0.37).sin() * 30.0, (i as f64 * 0.11).cos() * 30.0))
        .collect();
    let a = ClusterIndex::build(points.clone(), ClusterOptions::default()).expect("build failed");
    let b = ClusterIndex::build(points, ClusterOptions::default()).expect("build failed");

    for zoom in 0..=13 {
        let left = a.query(&GeoBounds::world(), f64::from(zoom));
        let right = b.query(&GeoBounds::world(), f64::from(zoom));
        assert_eq!(left.len(), right.len());
        for (l, r) in left.iter().zip(&right) {
            assert_eq!(l.point_count(), r.point_count());
            assert_eq!(l.position(), r.position());
        }
    }
}

#[test]
fn test_single_point_is_never_clustered() {
    let index = ClusterIndex::build(vec![marker(1, 7.0, 7.0)], ClusterOptions::default())
        .expect("build failed");
    for zoom in 0..=13 {
        let nodes = index.query(&GeoBounds::world(), f64::from(zoom));
        assert_eq!(nodes.len(), 1);
        assert!(!nodes[0].is_cluster());
    }
    assert_eq!(index.stats().clusters, 0);
}

#[test]
fn test_large_cluster_expands_completely() {
    init_logging();
    let points: Vec<MarkerPoint> = (0..20_000)
        .map(|i| marker(i, 5.0 + (i % 200) as f64 * 1e-4, 5.0 + (i / 200) as f64 * 1e-4))
        .collect();
    let index = ClusterIndex::build(points, ClusterOptions::default()).expect("build failed");

    let top = index.query(&GeoBounds::world(), 0.0);
    assert_eq!(top.len(), 1);
    let cluster = top[0].as_aggregate().expect("expected a cluster");
    assert_eq!(cluster.point_count, 20_000);
    assert_eq!(cluster.abbreviated_count(), "20k");

    let leaves = index
        .get_leaves(cluster.id, None, 0)
        .expect("leaves failed");
    assert_eq!(leaves.len(), 20_000);

    let mut ids: Vec<i64> = leaves
        .iter()
        .map(|leaf| match leaf.point.id {
            PointId::Number(n) => n,
            PointId::String(_) => panic!("unexpected string id"),
        })
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 20_000);
}

#[test]
fn test_children_partition_parent() {
    let points: Vec<MarkerPoint> = (0..400)
        .map(|i| marker(i, (i % 20) as f64 * 0.5, (i / 20) as f64 * 0.5))
        .collect();
    let index = ClusterIndex::build(points, ClusterOptions::default()).expect("build failed");

    for zoom in 0..=12 {
        for node in index.query(&GeoBounds::world(), f64::from(zoom)) {
            let Some(cluster) = node.as_aggregate() else {
                continue;
            };
            let children = index.get_children(cluster.id).expect("children failed");
            assert!(children.len() >= 2);
            assert_eq!(total_count(&children), cluster.point_count);

            let expansion = index
                .get_cluster_expansion_zoom(cluster.id)
                .expect("expansion failed");
            assert!(expansion > cluster.zoom);
            assert!(expansion <= 13);
        }
    }
}
