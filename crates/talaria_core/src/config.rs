use std::time::Duration;

/// Service-area and kinematic parameters. Defaults are the Hilla / Babylon
/// deployment the service was built for.
#[derive(Clone, Debug)]
pub struct FleetConfig {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,

    /// Grid cell edge length in km.
    pub cell_km: f64,

    /// Equirectangular scale factors for the service latitude band.
    pub km_per_deg_lat: f64,
    pub km_per_deg_lon: f64,

    pub speed_kmh: f64,
    pub tick: Duration,

    /// A UAV closer than this to its target has arrived.
    pub arrival_threshold_km: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        FleetConfig {
            lat_min: 32.1,
            lat_max: 32.8,
            lon_min: 44.1,
            lon_max: 44.8,
            cell_km: 5.0,
            km_per_deg_lat: 111.0,
            km_per_deg_lon: 94.0,
            speed_kmh: 40.0,
            tick: Duration::from_secs(1),
            arrival_threshold_km: 0.05,
        }
    }
}

impl FleetConfig {
    /// Distance covered in one tick at cruise speed.
    pub fn step_km(&self) -> f64 {
        self.speed_kmh / 3600.0 * self.tick.as_secs_f64()
    }
}
