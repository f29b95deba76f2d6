use shared_models::GeoPoint;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
const METERS_PER_MILE: f64 = 1_609.344;

/// Great-circle distance in miles.
pub fn haversine_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c / METERS_PER_MILE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        let p = GeoPoint::new(40.7282, -73.7949);
        assert_eq!(haversine_miles(p, p), 0.0);
    }

    #[test]
    fn test_astoria_to_jamaica() {
        let astoria = GeoPoint::new(40.7644, -73.9235);
        let jamaica = GeoPoint::new(40.7027, -73.7890);
        let miles = haversine_miles(astoria, jamaica);
        assert!((8.0..8.8).contains(&miles), "got {}", miles);
        assert!((miles - haversine_miles(jamaica, astoria)).abs() < 1e-9);
    }
}
