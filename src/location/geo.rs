//! Great-circle distance between two coordinates.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres between two lat/lon pairs in degrees.
///
/// Pure and total: non-finite inputs propagate as NaN rather than panicking,
/// which drops the coordinate out of any radius comparison downstream.
#[must_use]
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat_delta = (lat2 - lat1).to_radians();
    let lon_delta = (lon2 - lon1).to_radians();

    let a = (lat_delta / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (lon_delta / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    // Campus reference point (Seoul).
    const LAT: f64 = 37.5665;
    const LON: f64 = 126.978;

    #[test]
    fn identical_points_are_zero_distance() {
        assert!(distance_km(LAT, LON, LAT, LON).abs() < 1e-12);
    }

    #[test]
    fn distance_is_symmetric() {
        let forward = distance_km(LAT, LON, 37.58, 127.0);
        let backward = distance_km(37.58, 127.0, LAT, LON);
        assert!((forward - backward).abs() < 1e-12);
    }

    #[test]
    fn pure_latitude_offset_matches_arc_length() {
        // 0.0044966 degrees of latitude is ~0.5 km of arc.
        let d = distance_km(LAT, LON, LAT + 0.004_496_6, LON);
        assert!((d - 0.5).abs() < 1e-3, "got {d}");
    }

    #[test]
    fn known_city_pair_distance() {
        // Seoul to Busan, roughly 325 km.
        let d = distance_km(37.5665, 126.978, 35.1796, 129.0756);
        assert!((d - 325.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn nan_input_propagates_nan() {
        assert!(distance_km(f64::NAN, LON, LAT, LON).is_nan());
        assert!(distance_km(LAT, LON, LAT, f64::NAN).is_nan());
    }
}
