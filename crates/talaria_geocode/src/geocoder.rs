use thiserror::Error;

use talaria_core::geo::GeoPoint;

#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The provider answered but had no match for any query variant.
    /// Distinct from `Unavailable`: a dead provider is not a missing place.
    #[error("no geocoding match for the given place")]
    NoMatch,

    /// Provider unreachable or consistently slow; retries exhausted.
    #[error("geocoding provider unavailable after {attempts} attempts")]
    Unavailable { attempts: u32 },

    /// Non-transient provider refusal (4xx).
    #[error("geocoding provider rejected the request: {status} - {message}")]
    Rejected { status: u16, message: String },

    #[error("malformed geocoding response: {0}")]
    MalformedResponse(String),
}

/// Seam between dispatch and the external geocoding provider. The real
/// implementation talks to Nominatim; tests substitute a canned one.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, place: &str) -> impl Future<Output = Result<GeoPoint, GeocodeError>> + Send;
}
