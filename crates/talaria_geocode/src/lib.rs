mod geocoder;
mod nominatim;

pub use geocoder::{GeocodeError, Geocoder};
pub use nominatim::{
    DEFAULT_USER_AGENT, NOMINATIM_SEARCH_URL, NominatimClient, NominatimClientParams,
};
