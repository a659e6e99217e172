use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use talaria_core::geo::GeoPoint;
use talaria_core::vehicle::{Vehicle, VehicleStatus};

use crate::state::AppState;

/// Unprocessed fleet state, in the shape the dashboard and the external
/// airspace/prediction collaborator consume. Predictions and separation
/// distances are that collaborator's job, not ours.
#[derive(Serialize)]
pub struct UavDto {
    uav_id: String,
    lat: f64,
    lon: f64,
    status: VehicleStatus,
    target: Option<GeoPoint>,
}

impl From<Vehicle> for UavDto {
    fn from(vehicle: Vehicle) -> Self {
        UavDto {
            uav_id: vehicle.id.to_string(),
            lat: vehicle.position.lat,
            lon: vehicle.position.lon,
            status: vehicle.status,
            target: vehicle.target,
        }
    }
}

#[derive(Serialize)]
pub struct UavsResponse {
    uavs: Vec<UavDto>,
}

/// Per-vehicle-consistent snapshot of the whole fleet.
pub async fn list_uavs(State(state): State<Arc<AppState>>) -> Json<UavsResponse> {
    let uavs = state
        .fleet
        .snapshot_all()
        .into_iter()
        .map(UavDto::from)
        .collect();

    Json(UavsResponse { uavs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use talaria_core::grid::GridCell;

    #[test]
    fn dto_renders_the_wire_id_and_status() {
        let vehicle = Vehicle::parked(GridCell { gx: 2, gy: 3 }, GeoPoint::new(32.2, 44.2));
        let json = serde_json::to_value(UavDto::from(vehicle)).unwrap();

        assert_eq!(json["uav_id"], "UAV_2_3");
        assert_eq!(json["status"], "idle");
        assert_eq!(json["target"], serde_json::Value::Null);
    }
}
