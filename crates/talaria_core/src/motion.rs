use crate::geo::GeoPoint;

/// Advance `position` by `step_km` toward `target` by scaling the remaining
/// lat/lon deltas. A homing approximation rather than a geodesic integrator;
/// good enough over a few tens of km. Steps past the target are clamped onto
/// it so a coarse tick cannot overshoot and oscillate.
pub fn step_toward(position: &GeoPoint, target: &GeoPoint, step_km: f64) -> GeoPoint {
    let remaining_km = position.haversine_km(target);
    if remaining_km <= step_km || remaining_km == 0.0 {
        return *target;
    }

    let fraction = step_km / remaining_km;
    GeoPoint {
        lat: position.lat + (target.lat - position.lat) * fraction,
        lon: position.lon + (target.lon - position.lon) * fraction,
    }
}
