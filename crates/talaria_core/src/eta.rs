/// Straight-line flight time in minutes. No acceleration or queuing model.
pub fn eta_minutes(distance_km: f64, speed_kmh: f64) -> f64 {
    distance_km / speed_kmh * 60.0
}
