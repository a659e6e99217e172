use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::config::FleetConfig;
use crate::geo::GeoPoint;

/// Integer cell coordinates inside the service grid. Doubles as the vehicle
/// id, rendered as `UAV_{gx}_{gy}` on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub gx: i32,
    pub gy: i32,
}

impl Display for GridCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UAV_{}_{}", self.gx, self.gy)
    }
}

/// Flat-earth mapping from a position to a grid cell. Only valid over the
/// small service area; callers must gate with `contains` before `locate`,
/// which does not range-check and will happily return a cell outside the
/// grid for an out-of-range input.
#[derive(Clone, Debug)]
pub struct GridIndex {
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
    cell_km: f64,
    km_per_deg_lat: f64,
    km_per_deg_lon: f64,
    width: i32,
    height: i32,
}

impl GridIndex {
    pub fn new(config: &FleetConfig) -> Self {
        let span_x_km = (config.lon_max - config.lon_min) * config.km_per_deg_lon;
        let span_y_km = (config.lat_max - config.lat_min) * config.km_per_deg_lat;

        GridIndex {
            lat_min: config.lat_min,
            lat_max: config.lat_max,
            lon_min: config.lon_min,
            lon_max: config.lon_max,
            cell_km: config.cell_km,
            km_per_deg_lat: config.km_per_deg_lat,
            km_per_deg_lon: config.km_per_deg_lon,
            width: (span_x_km / config.cell_km).ceil() as i32,
            height: (span_y_km / config.cell_km).ceil() as i32,
        }
    }

    /// Cell columns (longitude axis).
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Cell rows (latitude axis).
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Inclusive bounding-box check.
    pub fn contains(&self, p: &GeoPoint) -> bool {
        self.lat_min <= p.lat && p.lat <= self.lat_max && self.lon_min <= p.lon && p.lon <= self.lon_max
    }

    pub fn locate(&self, p: &GeoPoint) -> GridCell {
        let x_km = (p.lon - self.lon_min) * self.km_per_deg_lon;
        let y_km = (p.lat - self.lat_min) * self.km_per_deg_lat;

        let mut gx = (x_km / self.cell_km).floor() as i32;
        let mut gy = (y_km / self.cell_km).floor() as i32;

        // The box is inclusive on its upper edge: a point exactly on
        // lon_max/lat_max belongs to the last column/row, not one past it.
        if p.lon == self.lon_max {
            gx = self.width - 1;
        }
        if p.lat == self.lat_max {
            gy = self.height - 1;
        }

        GridCell { gx, gy }
    }

    /// Geographic center of a cell; the parked position of its UAV.
    pub fn cell_center(&self, cell: &GridCell) -> GeoPoint {
        let x_km = (cell.gx as f64 + 0.5) * self.cell_km;
        let y_km = (cell.gy as f64 + 0.5) * self.cell_km;

        GeoPoint {
            lat: self.lat_min + y_km / self.km_per_deg_lat,
            lon: self.lon_min + x_km / self.km_per_deg_lon,
        }
    }

    /// All valid cells, row-major.
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        (0..self.height).flat_map(move |gy| (0..self.width).map(move |gx| GridCell { gx, gy }))
    }
}
