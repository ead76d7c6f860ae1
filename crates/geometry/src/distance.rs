use crate::point::GeoPoint;

/// Mean Earth radius used for every distance in the workspace.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometres (haversine on a
/// spherical Earth). Symmetric, and zero for identical inputs.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lon = (b.lon - a.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_for_identical_points() {
        let p = GeoPoint::new(41.329, 19.817);
        assert_eq!(distance_km(p, p), 0.0);
    }

    #[test]
    fn symmetric() {
        let a = GeoPoint::new(41.329, 19.817);
        let b = GeoPoint::new(41.33, 19.82);
        assert_eq!(distance_km(a, b), distance_km(b, a));
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        let expected = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
        assert!((d - expected).abs() < 1e-9, "got {d}");
    }

    #[test]
    fn tirana_neighbourhood_shift() {
        let d = distance_km(GeoPoint::new(41.3290, 19.8170), GeoPoint::new(41.3300, 19.8200));
        assert!(d > 0.2 && d < 0.35, "got {d}");

        let far = distance_km(GeoPoint::new(41.3290, 19.8170), GeoPoint::new(41.3290, 19.0000));
        assert!(far > 65.0 && far < 72.0, "got {far}");
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let d = distance_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 180.0));
        assert!((d - EARTH_RADIUS_KM * std::f64::consts::PI).abs() < 1e-6);
    }
}
