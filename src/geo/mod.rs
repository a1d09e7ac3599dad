use crate::error::AppError;
use crate::models::location::Location;

const EARTH_RADIUS_KM: f64 = 6_371.0;
const AVERAGE_SPEED_KMPH: f64 = 40.0;
const TRAFFIC_FACTOR: f64 = 1.3;

/// Great-circle distance between two coordinates in kilometers.
pub fn haversine_km(a: &Location, b: &Location) -> Result<f64, AppError> {
    a.validate()?;
    b.validate()?;

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lng = (b.longitude - a.longitude).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().atan2((1.0 - haversine).sqrt());

    Ok(EARTH_RADIUS_KM * central_angle)
}

/// Travel-time estimate at 40 km/h average speed with a 1.3x traffic
/// inflation.
pub fn estimate_minutes(distance_km: f64) -> f64 {
    (distance_km / AVERAGE_SPEED_KMPH) * TRAFFIC_FACTOR * 60.0
}

#[cfg(test)]
mod tests {
    use super::{estimate_minutes, haversine_km};
    use crate::error::AppError;
    use crate::models::location::Location;

    #[test]
    fn zero_distance_for_same_point() {
        let p = Location {
            latitude: 28.6139,
            longitude: 77.2090,
        };
        let distance = haversine_km(&p, &p).unwrap();
        assert!(distance < 1e-9);
    }

    #[test]
    fn london_to_paris_is_around_343_km() {
        let london = Location {
            latitude: 51.5074,
            longitude: -0.1278,
        };
        let paris = Location {
            latitude: 48.8566,
            longitude: 2.3522,
        };
        let distance = haversine_km(&london, &paris).unwrap();
        assert!((distance - 343.0).abs() < 5.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Location {
            latitude: 28.6139,
            longitude: 77.2090,
        };
        let b = Location {
            latitude: 28.7041,
            longitude: 77.1025,
        };
        let forward = haversine_km(&a, &b).unwrap();
        let backward = haversine_km(&b, &a).unwrap();
        assert!((forward - backward).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_latitude_is_rejected() {
        let bad = Location {
            latitude: 91.0,
            longitude: 0.0,
        };
        let good = Location {
            latitude: 0.0,
            longitude: 0.0,
        };
        let err = haversine_km(&bad, &good).unwrap_err();
        assert!(matches!(err, AppError::InvalidCoordinate { .. }));
    }

    #[test]
    fn non_finite_longitude_is_rejected() {
        let bad = Location {
            latitude: 0.0,
            longitude: f64::NAN,
        };
        let good = Location {
            latitude: 0.0,
            longitude: 0.0,
        };
        assert!(haversine_km(&good, &bad).is_err());
    }

    #[test]
    fn eta_scales_with_distance() {
        // 40 km at 40 km/h is one hour, inflated by 1.3 for traffic.
        assert!((estimate_minutes(40.0) - 78.0).abs() < 1e-9);
        assert_eq!(estimate_minutes(0.0), 0.0);
    }
}
