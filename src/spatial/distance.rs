//! Distance helpers.

use geo::{Distance, Euclidean, Haversine};

use crate::models::GeoPoint;

/// Linear degrees-to-kilometres factor used for per-point annotation
pub const KM_PER_DEGREE: f64 = 111.0;

/// Great-circle distance in metres
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    Haversine.distance(a.to_point(), b.to_point())
}

/// Planar distance in degrees scaled by [`KM_PER_DEGREE`].
///
/// Good to roughly a kilometre over short ranges; longitude degrees are not
/// shortened with latitude.
pub fn approx_km(a: GeoPoint, b: GeoPoint) -> f64 {
    Euclidean.distance(a.to_point(), b.to_point()) * KM_PER_DEGREE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_one_degree_latitude() {
        let d = haversine_m(GeoPoint::new(45.0, 9.0), GeoPoint::new(46.0, 9.0));
        assert!((d - 111_195.0).abs() < 100.0, "distance was {}", d);
    }

    #[test]
    fn test_approx_km_linear() {
        let d = approx_km(GeoPoint::new(45.0, 9.0), GeoPoint::new(45.0, 9.01));
        assert!((d - 1.11).abs() < 1e-9);
    }

    #[test]
    fn test_zero_distance() {
        let p = GeoPoint::new(41.9, 12.5);
        assert_eq!(haversine_m(p, p), 0.0);
        assert_eq!(approx_km(p, p), 0.0);
    }
}
