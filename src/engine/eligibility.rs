use crate::error::AppError;
use crate::geo::{self, GeoPoint};

/// Geographic half of the claim rule: the rider must have supplied a current
/// position (a failed geolocation lookup upstream arrives here as `None`,
/// never as a default coordinate) and must be within `radius_km` of the
/// pickup. Returns the computed distance so callers can surface it.
pub fn check(
    position: Option<&GeoPoint>,
    pickup: &GeoPoint,
    radius_km: f64,
) -> Result<f64, AppError> {
    let position = position.ok_or(AppError::NoPosition)?;
    let distance_km = geo::distance_km(position, pickup)?;

    if distance_km > radius_km {
        return Err(AppError::TooFar {
            distance_km,
            radius_km,
        });
    }

    Ok(distance_km)
}
