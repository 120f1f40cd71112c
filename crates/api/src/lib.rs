mod error;
mod request_id;
pub mod routes;

pub use error::ApiError;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, Router};
use chrono::{DateTime, Utc};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use strategy::Advisor;

/// Shared application state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub advisor: Arc<Advisor>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(advisor: Arc<Advisor>) -> Self {
        Self {
            advisor,
            started_at: Utc::now(),
        }
    }
}

/// Every route, with CORS and per-request tracing applied.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    Router::new()
        .merge(routes::health_router())
        .merge(routes::strategies_router())
        .merge(routes::advisory_router())
        .fallback(routes::not_found)
        .with_state(state)
        .layer(middleware::from_fn(request_id::trace_request))
        .layer(cors)
}

/// Bind `addr` and serve until the process is interrupted.
pub async fn serve(state: AppState, addr: SocketAddr) -> common::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Advisory API listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
