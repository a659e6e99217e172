mod dispatch;
mod error;
mod health;
mod order;
mod state;
mod uavs;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::Method;
use axum::routing::{get, post};
use axum::{Router, serve};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{Level, info};

use talaria_core::config::FleetConfig;
use talaria_core::fleet::FleetRegistry;
use talaria_core::grid::GridIndex;
use talaria_core::orderlog::OrderLog;
use talaria_core::sim::MovementSimulator;
use talaria_geocode::{NominatimClient, NominatimClientParams};

use crate::dispatch::DispatchService;
use crate::state::AppState;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn fleet_config() -> anyhow::Result<FleetConfig> {
    let mut config = FleetConfig::default();
    if let Ok(tick_ms) = std::env::var("TALARIA_TICK_MS") {
        let millis: u64 = tick_ms.parse().context("TALARIA_TICK_MS must be an integer")?;
        config.tick = Duration::from_millis(millis);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = fleet_config()?;
    let grid = GridIndex::new(&config);
    let fleet = Arc::new(FleetRegistry::new(&grid));
    info!(
        width = grid.width(),
        height = grid.height(),
        vehicles = fleet.len(),
        "fleet initialized"
    );

    let log_path = PathBuf::from(env_or("TALARIA_ORDER_LOG", "orders.csv"));
    let log = OrderLog::open(&log_path)
        .with_context(|| format!("open order log at {}", log_path.display()))?;

    let geocoder = NominatimClient::new(NominatimClientParams {
        base_url: env_or("TALARIA_NOMINATIM_URL", talaria_geocode::NOMINATIM_SEARCH_URL),
        user_agent: env_or("TALARIA_USER_AGENT", talaria_geocode::DEFAULT_USER_AGENT),
        ..NominatimClientParams::default()
    });

    let dispatcher = DispatchService::new(
        geocoder,
        grid.clone(),
        Arc::clone(&fleet),
        log,
        config.speed_kmh,
    );

    let simulator = MovementSimulator::new(Arc::clone(&fleet), &config);
    tokio::spawn(simulator.run());

    let state = Arc::new(AppState { fleet, dispatcher });

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(health::root))
        .route("/healthz", get(health::healthz))
        .route("/order", post(order::create_order))
        .route("/uavs", get(uavs::list_uavs))
        .layer(ServiceBuilder::new().layer(cors_layer))
        .with_state(state);

    let bind = env_or("TALARIA_BIND", "127.0.0.1:8080");
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    info!(%bind, "listening");

    serve(listener, app).await?;
    Ok(())
}
