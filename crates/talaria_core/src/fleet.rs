use fxhash::FxHashMap;
use parking_lot::Mutex;
use thiserror::Error;

use crate::geo::GeoPoint;
use crate::grid::{GridCell, GridIndex};
use crate::motion::step_toward;
use crate::vehicle::{Vehicle, VehicleStatus};

#[derive(Debug, Error, PartialEq)]
pub enum FleetError {
    /// Every grid cell gets a vehicle at startup, so this can only mean a
    /// caller bypassed the boundary check. Programmer error; callers log
    /// it and fail loudly rather than swallow it.
    #[error("no vehicle registered for cell {0}")]
    UnknownCell(GridCell),

    #[error("vehicle {0} is already delivering")]
    AlreadyBusy(GridCell),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Moved,
    Arrived,
}

/// Sole owner of mutable vehicle state. One mutex per vehicle: every
/// operation is a single critical section, so an assignment and a movement
/// tick on the same vehicle serialize, and the (position, status, target)
/// triple can never be observed half-updated. Callers only ever get value
/// snapshots, never references into the map.
pub struct FleetRegistry {
    vehicles: FxHashMap<GridCell, Mutex<Vehicle>>,
}

impl FleetRegistry {
    /// One parked vehicle per grid cell, centered in its cell.
    pub fn new(grid: &GridIndex) -> Self {
        let vehicles = grid
            .cells()
            .map(|cell| (cell, Mutex::new(Vehicle::parked(cell, grid.cell_center(&cell)))))
            .collect();

        FleetRegistry { vehicles }
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn snapshot(&self, cell: &GridCell) -> Option<Vehicle> {
        self.vehicles.get(cell).map(|slot| *slot.lock())
    }

    /// Per-vehicle-consistent listing, ordered by cell for stable output.
    /// Consistency across vehicles is not promised and not needed.
    pub fn snapshot_all(&self) -> Vec<Vehicle> {
        let mut all: Vec<Vehicle> = self.vehicles.values().map(|slot| *slot.lock()).collect();
        all.sort_by_key(|v| v.id);
        all
    }

    /// Commit a delivery target. Busy vehicles reject the assignment; an
    /// in-flight delivery is never silently abandoned. On success returns
    /// the position the vehicle had at commit time, so the caller derives
    /// the ETA from the same instant the transition happened.
    pub fn assign_target(&self, cell: &GridCell, target: GeoPoint) -> Result<GeoPoint, FleetError> {
        let slot = self.vehicles.get(cell).ok_or(FleetError::UnknownCell(*cell))?;
        let mut vehicle = slot.lock();

        if vehicle.status == VehicleStatus::Delivering {
            return Err(FleetError::AlreadyBusy(*cell));
        }

        vehicle.status = VehicleStatus::Delivering;
        vehicle.target = Some(target);
        Ok(vehicle.position)
    }

    /// One movement-tick commit, entirely inside the vehicle's critical
    /// section. Within `arrive_within_km` of the target the vehicle snaps
    /// onto it and goes idle; otherwise it advances one homing step.
    pub fn advance(
        &self,
        cell: &GridCell,
        step_km: f64,
        arrive_within_km: f64,
    ) -> Result<TickOutcome, FleetError> {
        let slot = self.vehicles.get(cell).ok_or(FleetError::UnknownCell(*cell))?;
        let mut vehicle = slot.lock();

        let Some(target) = vehicle.target else {
            return Ok(TickOutcome::Idle);
        };

        if vehicle.position.haversine_km(&target) < arrive_within_km {
            vehicle.position = target;
            vehicle.target = None;
            vehicle.status = VehicleStatus::Idle;
            return Ok(TickOutcome::Arrived);
        }

        vehicle.position = step_toward(&vehicle.position, &target, step_km);
        Ok(TickOutcome::Moved)
    }

    /// Cells whose vehicle currently has a target.
    pub fn delivering_cells(&self) -> Vec<GridCell> {
        self.vehicles
            .iter()
            .filter(|(_, slot)| slot.lock().status == VehicleStatus::Delivering)
            .map(|(cell, _)| *cell)
            .collect()
    }
}
