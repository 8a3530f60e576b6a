//! Straight-line distance on a spherical earth. Accurate enough for the
//! tens-of-kilometres radii dispatch works with.

use crate::{CoreError, CoreResult};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Anything with an optional position.
pub trait Locatable {
    fn coordinates(&self) -> Option<(f64, f64)>;
}

/// Haversine great-circle distance in kilometres.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Keeps candidates with a known position no further than `radius_km`,
/// paired with their distance, nearest first.
pub fn find_eligible<T: Locatable>(
    candidates: Vec<T>,
    origin_lat: f64,
    origin_lon: f64,
    radius_km: f64,
) -> Vec<(T, f64)> {
    let mut eligible: Vec<(T, f64)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let (lat, lon) = candidate.coordinates()?;
            let distance = distance_km(origin_lat, origin_lon, lat, lon);
            (distance <= radius_km).then_some((candidate, distance))
        })
        .collect();

    eligible.sort_by(|a, b| a.1.total_cmp(&b.1));
    eligible
}

/// Two-decimal snapshot stored on a request.
pub fn round_km(distance: f64) -> f64 {
    (distance * 100.0).round() / 100.0
}

pub fn validate_coordinates(lat: f64, lon: f64) -> CoreResult<()> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(CoreError::ValidationError(format!("latitude out of range: {}", lat)));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err(CoreError::ValidationError(format!("longitude out of range: {}", lon)));
    }
    Ok(())
}
