use axum::Json;
use serde_json::json;

/// GET /health - liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}
