use axum::Json;
use serde_json::{Value, json};

pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Root probe kept for the dashboard's connectivity check.
pub async fn root() -> Json<Value> {
    Json(json!({ "service": "talaria", "status": "running" }))
}
