use axum::{body::Bytes, extract::State, routing::post, Json, Router};

use common::{Advisory, ConsensusResult};

use super::parse_payload;
use crate::{ApiError, AppState};

pub fn advisory_router() -> Router<AppState> {
    Router::new()
        .route("/advisory", post(advisory))
        .route("/analyze", post(analyze))
}

async fn advisory(State(state): State<AppState>, body: Bytes) -> Result<Json<Advisory>, ApiError> {
    let payload = parse_payload(&body)?;
    Ok(Json(state.advisor.advise(&payload).await))
}

/// Consensus decision. A result without a usable stop level is refused.
async fn analyze(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ConsensusResult>, ApiError> {
    let payload = parse_payload(&body)?;
    let out = state.advisor.consensus(&payload).await;
    if out.result.stop_loss <= 0.0 {
        return Err(ApiError::bad_request("invalid payload"));
    }
    Ok(Json(out))
}
