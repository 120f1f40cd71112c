mod advisory;
mod health;
mod strategies;

pub use advisory::advisory_router;
pub use health::health_router;
pub use strategies::strategies_router;

use axum::body::Bytes;
use serde_json::{json, Value};

use common::Error;

use crate::ApiError;

/// Unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::not_found()
}

/// Request document: an empty body counts as `{}`.
fn parse_payload(body: &Bytes) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body).map_err(|e| Error::from(e).into())
}
