use std::time::Duration;

use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::{debug, warn};

use talaria_core::geo::GeoPoint;

use crate::geocoder::{GeocodeError, Geocoder};

pub const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Free-text query suffix biasing results toward the service area.
const DEFAULT_LOCALE_HINT: &str = "الحلة العراق";

/// Nominatim's usage policy wants an identifying User-Agent with a contact
/// address; deployments override it with their own.
pub const DEFAULT_USER_AGENT: &str = "talaria/0.1 (ops@talaria.example)";

pub struct NominatimClientParams {
    pub base_url: String,
    pub locale_hint: String,
    /// Nominatim's usage policy requires an identifying User-Agent.
    pub user_agent: String,
    pub timeout: Duration,
    /// Attempts per query variant before giving up on the provider.
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for NominatimClientParams {
    fn default() -> Self {
        NominatimClientParams {
            base_url: String::from(NOMINATIM_SEARCH_URL),
            locale_hint: String::from(DEFAULT_LOCALE_HINT),
            user_agent: String::from(DEFAULT_USER_AGENT),
            timeout: Duration::from_secs(10),
            max_attempts: 3,
            backoff_base: Duration::from_millis(250),
        }
    }
}

/// Nominatim serves coordinates as JSON strings.
#[derive(Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

enum RequestFailure {
    /// Timeout, connection error or 5xx; worth retrying.
    Transient(String),
    /// 4xx; the provider will keep refusing, do not retry.
    Rejected { status: u16, message: String },
    Malformed(String),
}

pub struct NominatimClient {
    params: NominatimClientParams,
    client: reqwest::Client,
}

impl NominatimClient {
    pub fn new(params: NominatimClientParams) -> Self {
        Self {
            params,
            client: reqwest::Client::new(),
        }
    }

    /// The place text as sent to the provider: first suffixed with the
    /// locale hint, then bare as a fallback.
    fn query_variants(&self, place: &str) -> Vec<String> {
        if self.params.locale_hint.is_empty() {
            return vec![place.to_string()];
        }
        vec![format!("{place} {}", self.params.locale_hint), place.to_string()]
    }

    async fn request(&self, query: &str) -> Result<Option<GeoPoint>, RequestFailure> {
        let response = self
            .client
            .get(&self.params.base_url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .header(USER_AGENT, self.params.user_agent.as_str())
            .timeout(self.params.timeout)
            .send()
            .await
            .map_err(|e| RequestFailure::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(RequestFailure::Transient(format!("server error {status}")));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RequestFailure::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RequestFailure::Transient(e.to_string()))?;

        parse_best_match(&body).map_err(RequestFailure::Malformed)
    }

    /// One query variant with bounded retry and exponential backoff on
    /// transient failures. `Ok(None)` means the provider answered and had
    /// no match for this variant.
    async fn lookup_variant(&self, query: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        for attempt in 1..=self.params.max_attempts {
            match self.request(query).await {
                Ok(hit) => return Ok(hit),
                Err(RequestFailure::Transient(reason)) => {
                    if attempt == self.params.max_attempts {
                        warn!(query, attempt, %reason, "geocode retries exhausted");
                        return Err(GeocodeError::Unavailable { attempts: attempt });
                    }
                    let backoff = self.params.backoff_base * 2u32.pow(attempt - 1);
                    debug!(
                        query,
                        attempt,
                        %reason,
                        backoff_ms = backoff.as_millis() as u64,
                        "transient geocode failure, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(RequestFailure::Rejected { status, message }) => {
                    return Err(GeocodeError::Rejected { status, message });
                }
                Err(RequestFailure::Malformed(detail)) => {
                    return Err(GeocodeError::MalformedResponse(detail));
                }
            }
        }
        Err(GeocodeError::Unavailable {
            attempts: self.params.max_attempts,
        })
    }
}

impl Geocoder for NominatimClient {
    async fn geocode(&self, place: &str) -> Result<GeoPoint, GeocodeError> {
        for query in self.query_variants(place) {
            if let Some(point) = self.lookup_variant(&query).await? {
                debug!(query, lat = point.lat, lon = point.lon, "geocoded");
                return Ok(point);
            }
        }
        Err(GeocodeError::NoMatch)
    }
}

/// Best match out of a Nominatim JSON array, or `None` when the array is
/// empty.
fn parse_best_match(body: &str) -> Result<Option<GeoPoint>, String> {
    let places: Vec<NominatimPlace> =
        serde_json::from_str(body).map_err(|e| e.to_string())?;

    let Some(first) = places.first() else {
        return Ok(None);
    };

    let lat: f64 = first
        .lat
        .parse()
        .map_err(|_| format!("unparseable latitude {:?}", first.lat))?;
    let lon: f64 = first
        .lon
        .parse()
        .map_err(|_| format!("unparseable longitude {:?}", first.lon))?;

    Ok(Some(GeoPoint::new(lat, lon)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    /// Minimal one-connection-per-response HTTP stub. Serves the canned
    /// (status, body) pairs in order, counting requests, then closes.
    async fn stub_server(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);

                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;

                let response = format!(
                    "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        (format!("http://{addr}/search"), hits)
    }

    fn client_for(base_url: String) -> NominatimClient {
        NominatimClient::new(NominatimClientParams {
            base_url,
            backoff_base: Duration::ZERO,
            ..NominatimClientParams::default()
        })
    }

    #[tokio::test]
    async fn persistent_server_errors_exhaust_retries_into_unavailable() {
        let (url, hits) = stub_server(vec![(500, ""), (500, ""), (500, "")]).await;
        let client = client_for(url);

        let err = client.lookup_variant("hilla").await.unwrap_err();
        assert!(matches!(err, GeocodeError::Unavailable { attempts: 3 }), "got {err:?}");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn transient_failure_recovers_on_the_next_attempt() {
        let (url, hits) = stub_server(vec![(500, ""), (200, "[]")]).await;
        let client = client_for(url);

        // The retried attempt gets a clean empty answer: no match, no error.
        assert!(client.lookup_variant("hilla").await.unwrap().is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn client_errors_are_rejected_without_retry() {
        let (url, hits) = stub_server(vec![(404, "no such endpoint")]).await;
        let client = client_for(url);

        match client.lookup_variant("hilla").await.unwrap_err() {
            GeocodeError::Rejected { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "no such endpoint");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_answers_for_every_variant_become_no_match() {
        // Two variants (hinted, then bare), each answered cleanly with no hit.
        let (url, hits) = stub_server(vec![(200, "[]"), (200, "[]")]).await;
        let client = client_for(url);

        let err = client.geocode("nowhere").await.unwrap_err();
        assert!(matches!(err, GeocodeError::NoMatch), "got {err:?}");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn parses_the_first_match() {
        let body = r#"[{"lat": "32.4721", "lon": "44.4217", "display_name": "Hilla"}]"#;
        let point = parse_best_match(body).unwrap().unwrap();
        assert_eq!(point, GeoPoint::new(32.4721, 44.4217));
    }

    #[test]
    fn empty_result_set_is_no_match_not_an_error() {
        assert_eq!(parse_best_match("[]").unwrap(), None);
    }

    #[test]
    fn garbage_coordinates_are_malformed() {
        let body = r#"[{"lat": "north-ish", "lon": "44.4"}]"#;
        assert!(parse_best_match(body).is_err());
    }

    #[test]
    fn non_json_body_is_malformed() {
        assert!(parse_best_match("<html>rate limited</html>").is_err());
    }

    #[test]
    fn locale_hint_variant_comes_first() {
        let client = NominatimClient::new(NominatimClientParams::default());
        let variants = client.query_variants("Al-Jamiya Street");
        assert_eq!(variants.len(), 2);
        assert!(variants[0].starts_with("Al-Jamiya Street "));
        assert_eq!(variants[1], "Al-Jamiya Street");
    }

    #[test]
    fn default_user_agent_identifies_a_contact() {
        let params = NominatimClientParams::default();
        assert!(
            params.user_agent.contains('@'),
            "User-Agent {:?} has no contact address",
            params.user_agent
        );
    }

    #[test]
    fn empty_hint_yields_a_single_bare_variant() {
        let client = NominatimClient::new(NominatimClientParams {
            locale_hint: String::new(),
            ..NominatimClientParams::default()
        });
        assert_eq!(client.query_variants("Hilla"), vec!["Hilla"]);
    }
}
