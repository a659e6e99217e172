use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use talaria_core::eta::eta_minutes;
use talaria_core::fleet::{FleetError, FleetRegistry};
use talaria_core::geo::GeoPoint;
use talaria_core::grid::{GridCell, GridIndex};
use talaria_core::orderlog::{OrderLog, OrderRecord, OrderStatus};
use talaria_geocode::{GeocodeError, Geocoder};

/// Terminal result of one order, ready for wire mapping. Every variant has
/// already been written to the audit log by the time it is returned.
#[derive(Clone, Debug, PartialEq)]
pub enum DispatchOutcome {
    Accepted {
        cell: GridCell,
        location: GeoPoint,
        eta_minutes: f64,
    },
    /// Resolved fine, but outside the service box. The coordinates are
    /// still disclosed to the caller for diagnostics.
    OutsideServiceArea { location: GeoPoint },
    /// The owning vehicle is mid-delivery; assignment rejected rather than
    /// silently overwriting the in-flight target.
    VehicleBusy { cell: GridCell, location: GeoPoint },
    /// The provider answered and had no match.
    NotFound,
    /// The provider was unreachable, slow or refused; retries exhausted.
    GeocodeUnavailable { reason: String },
}

/// Orchestrates one order: geocode, boundary check, grid lookup, target
/// commit, ETA, audit record. Runs on the request task; the movement loop
/// never waits on it.
pub struct DispatchService<G> {
    geocoder: G,
    grid: GridIndex,
    fleet: Arc<FleetRegistry>,
    log: Mutex<OrderLog>,
    speed_kmh: f64,
}

impl<G: Geocoder> DispatchService<G> {
    pub fn new(
        geocoder: G,
        grid: GridIndex,
        fleet: Arc<FleetRegistry>,
        log: OrderLog,
        speed_kmh: f64,
    ) -> Self {
        DispatchService {
            geocoder,
            grid,
            fleet,
            log: Mutex::new(log),
            speed_kmh,
        }
    }

    /// The only error path is an internal invariant violation (a located
    /// cell with no owning vehicle); domain failures come back as outcomes.
    pub async fn dispatch(&self, order_id: i64, place: &str) -> Result<DispatchOutcome, FleetError> {
        let location = match self.geocoder.geocode(place).await {
            Ok(point) => point,
            Err(GeocodeError::NoMatch) => {
                self.record(order_id, place, None, None, OrderStatus::Failed);
                return Ok(DispatchOutcome::NotFound);
            }
            Err(err) => {
                warn!(order_id, %err, "geocoding unavailable");
                self.record(order_id, place, None, None, OrderStatus::Failed);
                return Ok(DispatchOutcome::GeocodeUnavailable {
                    reason: err.to_string(),
                });
            }
        };

        if !self.grid.contains(&location) {
            self.record(order_id, place, None, None, OrderStatus::Rejected);
            return Ok(DispatchOutcome::OutsideServiceArea { location });
        }

        let cell = self.grid.locate(&location);
        let from = match self.fleet.assign_target(&cell, location) {
            Ok(position) => position,
            Err(FleetError::AlreadyBusy(_)) => {
                self.record(order_id, place, None, None, OrderStatus::Rejected);
                return Ok(DispatchOutcome::VehicleBusy { cell, location });
            }
            Err(err) => {
                // A cell inside the box without a vehicle means the grid and
                // the fleet disagree; surface it, never swallow it.
                error!(order_id, %err, "fleet/grid mismatch");
                return Err(err);
            }
        };

        let eta = eta_minutes(from.haversine_km(&location), self.speed_kmh);
        self.record(
            order_id,
            place,
            Some(cell.to_string()),
            Some(eta),
            OrderStatus::Accepted,
        );
        info!(order_id, uav = %cell, eta_minutes = eta, "order accepted");

        Ok(DispatchOutcome::Accepted {
            cell,
            location,
            eta_minutes: eta,
        })
    }

    /// Audit append. The log is a peripheral sink: a write failure is
    /// reported loudly but does not fail the order.
    fn record(
        &self,
        order_id: i64,
        place: &str,
        assigned_uav: Option<String>,
        eta_minutes: Option<f64>,
        status: OrderStatus,
    ) {
        let record = OrderRecord {
            order_id,
            place: place.to_string(),
            assigned_uav,
            eta_minutes,
            status,
        };
        if let Err(err) = self.log.lock().append(&record) {
            error!(order_id, %err, "order log append failed");
        }
    }
}
