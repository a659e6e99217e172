use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::config::FleetConfig;
use crate::fleet::{FleetRegistry, TickOutcome};

/// The only periodic process in the system: a fixed-interval kinematic
/// update that walks every in-flight vehicle one step toward its target and
/// retires arrivals. All mutation goes through the registry, so each
/// vehicle's update serializes against concurrent dispatch assignments.
pub struct MovementSimulator {
    fleet: Arc<FleetRegistry>,
    tick: Duration,
    step_km: f64,
    arrival_threshold_km: f64,
}

impl MovementSimulator {
    pub fn new(fleet: Arc<FleetRegistry>, config: &FleetConfig) -> Self {
        MovementSimulator {
            fleet,
            tick: config.tick,
            step_km: config.step_km(),
            arrival_threshold_km: config.arrival_threshold_km,
        }
    }

    /// Perpetual tick loop. Spawn this on its own task; it never returns.
    pub async fn run(self) {
        info!(
            tick_ms = self.tick.as_millis() as u64,
            step_km = self.step_km,
            "movement simulator started"
        );

        let mut interval = tokio::time::interval(self.tick);
        loop {
            interval.tick().await;
            self.tick();
        }
    }

    /// One synchronous pass over the in-flight fleet.
    pub fn tick(&self) {
        for cell in self.fleet.delivering_cells() {
            match self.fleet.advance(&cell, self.step_km, self.arrival_threshold_km) {
                Ok(TickOutcome::Arrived) => info!(uav = %cell, "arrived at target"),
                Ok(TickOutcome::Moved) => debug!(uav = %cell, "advanced"),
                // Raced with an arrival earlier in the same scan; nothing to do.
                Ok(TickOutcome::Idle) => {}
                Err(err) => error!(uav = %cell, %err, "movement tick failed"),
            }
        }
    }
}
