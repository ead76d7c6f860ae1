//! Geometry layer for farmsync.
//!
//! Farm records carry an optional GeoJSON geometry alongside plain
//! latitude/longitude columns. This crate owns the geometry model and the two
//! spatial primitives everything else builds on:
//!
//! - [`representative_point`] collapses any supported [`Geometry`] to one
//!   `(lat, lon)` pair (vertex average for multi-vertex shapes).
//! - [`distance_km`] is the haversine great-circle distance on a 6371 km
//!   sphere.
//!
//! Both are pure and deterministic.
//!
//! ## Example
//!
//! ```
//! use geometry::{distance_km, representative_point, GeoPoint, Geometry};
//! use serde_json::json;
//!
//! let field = Geometry::from_geojson(&json!({
//!     "type": "Polygon",
//!     "coordinates": [[[19.81, 41.32], [19.83, 41.32], [19.83, 41.34], [19.81, 41.34]]]
//! }));
//! let centre = representative_point(&field).unwrap();
//! assert!((centre.lat - 41.33).abs() < 1e-9);
//!
//! let d = distance_km(centre, GeoPoint::new(41.33, 19.82));
//! assert!(d < 1e-6);
//! ```

mod distance;
mod error;
mod point;
mod shape;

pub use crate::distance::{distance_km, EARTH_RADIUS_KM};
pub use crate::error::GeometryError;
pub use crate::point::{representative_point, GeoPoint};
pub use crate::shape::{Coord, Geometry, GeometryKind};
