use std::sync::Arc;

use talaria_core::fleet::FleetRegistry;
use talaria_geocode::NominatimClient;

use crate::dispatch::DispatchService;

pub struct AppState {
    pub fleet: Arc<FleetRegistry>,
    pub dispatcher: DispatchService<NominatimClient>,
}
