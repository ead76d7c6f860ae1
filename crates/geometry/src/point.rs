//! Representative point extraction.
//!
//! Every supported geometry collapses to one `(latitude, longitude)` pair.
//! Points are returned as-is (with the GeoJSON axis order swapped), every
//! other shape returns the arithmetic mean of all of its vertices.
//!
//! The vertex mean is an approximation, not an area centroid. Nesting is
//! ignored (rings, holes and parts all contribute), and the closing vertex of
//! a ring is counted like any other, so a closed ring is pulled toward its
//! first corner. Long or unevenly sampled edges skew the result toward the
//! densely sampled side. This is good enough for proximity search and
//! shift detection on farm parcels a few kilometres across.

use serde::{Deserialize, Serialize};

use crate::shape::{Coord, Geometry};

/// A location in `(latitude, longitude)` order, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl From<Coord> for GeoPoint {
    fn from(c: Coord) -> Self {
        GeoPoint::new(c.y, c.x)
    }
}

/// Reduce a geometry to a single representative point.
///
/// Returns `None` for [`Geometry::Unsupported`] and for shapes without any
/// vertex.
pub fn representative_point(geometry: &Geometry) -> Option<GeoPoint> {
    match geometry {
        Geometry::Point(c) => Some(GeoPoint::from(*c)),
        Geometry::MultiPoint(cs) | Geometry::LineString(cs) => vertex_mean(cs.iter()),
        Geometry::MultiLineString(parts) | Geometry::Polygon(parts) => {
            vertex_mean(parts.iter().flatten())
        }
        Geometry::MultiPolygon(polys) => vertex_mean(polys.iter().flatten().flatten()),
        Geometry::Unsupported(_) => None,
    }
}

fn vertex_mean<'a>(coords: impl Iterator<Item = &'a Coord>) -> Option<GeoPoint> {
    let (sum_lon, sum_lat, count) = coords.fold((0.0_f64, 0.0_f64, 0_usize), |acc, c| {
        (acc.0 + c.x, acc.1 + c.y, acc.2 + 1)
    });
    if count == 0 {
        return None;
    }
    let n = count as f64;
    Some(GeoPoint::new(sum_lat / n, sum_lon / n))
}
