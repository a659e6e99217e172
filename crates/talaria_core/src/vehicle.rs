use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::grid::GridCell;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Idle,
    Delivering,
}

/// One UAV. Identity is its home grid cell; the fleet never grows or
/// shrinks after startup. Invariant, enforced by the registry: `target`
/// is `Some` exactly when `status` is `Delivering`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub id: GridCell,
    pub position: GeoPoint,
    pub status: VehicleStatus,
    pub target: Option<GeoPoint>,
}

impl Vehicle {
    pub fn parked(id: GridCell, position: GeoPoint) -> Self {
        Vehicle {
            id,
            position,
            status: VehicleStatus::Idle,
            target: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parked_vehicle_is_idle_with_no_target() {
        let v = Vehicle::parked(GridCell { gx: 1, gy: 2 }, GeoPoint::new(32.2, 44.2));
        assert_eq!(v.status, VehicleStatus::Idle);
        assert!(v.target.is_none());
    }
}
