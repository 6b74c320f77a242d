use crate::attendance::error::ClockError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Mean Earth radius for the spherical approximation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A latitude/longitude pair reported by a device or registered for a store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    #[schema(example = 48.85837)]
    pub latitude: f64,
    #[schema(example = 2.294481)]
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Rejects NaN/infinite values and out-of-range latitude or longitude.
pub fn validate(coords: &Coordinates) -> Result<(), ClockError> {
    let lat_ok = coords.latitude.is_finite() && coords.latitude.abs() <= 90.0;
    let lon_ok = coords.longitude.is_finite() && coords.longitude.abs() <= 180.0;
    if lat_ok && lon_ok {
        Ok(())
    } else {
        Err(ClockError::InvalidCoordinates {
            latitude: coords.latitude,
            longitude: coords.longitude,
        })
    }
}

/// Great-circle distance in meters between two points, haversine formula on
/// a spherical Earth. Pure and symmetric; expects validated coordinates.
pub fn distance_meters(from: &Coordinates, to: &Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = (to.latitude - from.latitude).to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}
