use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use talaria_core::geo::GeoPoint;
use talaria_core::orderlog::OrderStatus;

use crate::dispatch::DispatchOutcome;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct OrderRequest {
    pub order_id: i64,
    pub place: String,
}

#[derive(Serialize)]
pub struct OrderResponse {
    order_id: i64,
    input_place: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<GeoPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    grid: Option<[i32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assigned_uav: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    eta_minutes: Option<f64>,
    status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl OrderResponse {
    fn from_outcome(order_id: i64, input_place: String, outcome: DispatchOutcome) -> Self {
        let mut response = OrderResponse {
            order_id,
            input_place,
            location: None,
            grid: None,
            assigned_uav: None,
            eta_minutes: None,
            status: OrderStatus::Failed,
            reason: None,
        };

        match outcome {
            DispatchOutcome::Accepted { cell, location, eta_minutes } => {
                response.location = Some(location);
                response.grid = Some([cell.gx, cell.gy]);
                response.assigned_uav = Some(cell.to_string());
                response.eta_minutes = Some(eta_minutes);
                response.status = OrderStatus::Accepted;
            }
            DispatchOutcome::OutsideServiceArea { location } => {
                response.location = Some(location);
                response.status = OrderStatus::Rejected;
                response.reason = Some(String::from("outside service area"));
            }
            DispatchOutcome::VehicleBusy { cell, location } => {
                response.location = Some(location);
                response.grid = Some([cell.gx, cell.gy]);
                response.status = OrderStatus::Rejected;
                response.reason = Some(String::from("vehicle busy"));
            }
            DispatchOutcome::NotFound => {
                response.reason = Some(String::from("location not found"));
            }
            DispatchOutcome::GeocodeUnavailable { reason } => {
                response.reason = Some(reason);
            }
        }

        response
    }
}

/// Every domain outcome is a structured 200; only an internal invariant
/// violation becomes a transport error.
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let outcome = state
        .dispatcher
        .dispatch(body.order_id, &body.place)
        .await
        .map_err(anyhow::Error::new)?;

    Ok(Json(OrderResponse::from_outcome(
        body.order_id,
        body.place,
        outcome,
    )))
}
