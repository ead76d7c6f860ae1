//! The representative point is a vertex average. These tests pin down where it
//! agrees with the area-weighted centroid and where it drifts.

use geo::{Centroid, LineString, Polygon};
use geometry::{distance_km, representative_point, Coord, GeoPoint, Geometry};

fn area_centroid(ring: &[(f64, f64)]) -> GeoPoint {
    let polygon = Polygon::new(LineString::from(ring.to_vec()), vec![]);
    let centroid = polygon.centroid().expect("non-degenerate polygon");
    GeoPoint::new(centroid.y(), centroid.x())
}

fn as_geometry(ring: &[(f64, f64)]) -> Geometry {
    Geometry::Polygon(vec![ring.iter().map(|&(x, y)| Coord { x, y }).collect()])
}

#[test]
fn open_rectangle_matches_area_centroid() {
    let ring = [(0.0, 0.0), (4.0, 0.0), (4.0, 2.0), (0.0, 2.0)];
    let mean = representative_point(&as_geometry(&ring)).expect("point");
    let centroid = area_centroid(&ring);
    assert!((mean.lat - centroid.lat).abs() < 1e-12);
    assert!((mean.lon - centroid.lon).abs() < 1e-12);
}

#[test]
fn closed_ring_is_pulled_toward_first_vertex() {
    let ring = [(0.0, 0.0), (4.0, 0.0), (4.0, 2.0), (0.0, 2.0), (0.0, 0.0)];
    let mean = representative_point(&as_geometry(&ring)).expect("point");
    let centroid = area_centroid(&ring);

    assert!((centroid.lat - 1.0).abs() < 1e-12);
    assert!((centroid.lon - 2.0).abs() < 1e-12);
    assert!((mean.lat - 0.8).abs() < 1e-12);
    assert!((mean.lon - 1.6).abs() < 1e-12);
}

#[test]
fn unevenly_sampled_ring_skews_toward_dense_side() {
    // Square with extra vertices packed along the bottom edge.
    let ring = [
        (0.0, 0.0),
        (0.25, 0.0),
        (0.5, 0.0),
        (0.75, 0.0),
        (1.0, 0.0),
        (1.0, 1.0),
        (0.0, 1.0),
    ];
    let mean = representative_point(&as_geometry(&ring)).expect("point");
    let centroid = area_centroid(&ring);

    assert!((centroid.lat - 0.5).abs() < 1e-9);
    assert!(mean.lat < centroid.lat);
    assert!(distance_km(mean, centroid) > 10.0);
}
