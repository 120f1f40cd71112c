use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Liveness plus the number of strategies currently registered.
async fn health(State(state): State<AppState>) -> Json<Value> {
    let listing = state.advisor.listing().await;
    Json(json!({
        "ok": true,
        "strategies": listing.available.len(),
        "started_at": state.started_at.to_rfc3339(),
    }))
}
