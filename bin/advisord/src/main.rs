use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use api::AppState;
use common::{Config, Error};
use strategy::{Advisor, RegistryBuilder, RegistryHandle};
use tuner::ParameterTuner;

#[tokio::main]
async fn main() -> common::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    let addr: SocketAddr = format!("{}:{}", cfg.listen_host, cfg.listen_port)
        .parse()
        .map_err(|e| Error::Config(format!("invalid listen address: {e}")))?;
    info!(
        %addr,
        plugin_dir = %cfg.plugin_dir.display(),
        auto_reload = cfg.auto_reload,
        "Strategy advisor starting"
    );

    // ── Parameter tuner ───────────────────────────────────────────────────────
    let tuner = ParameterTuner::from_config(&cfg.tuner);
    info!(enabled = tuner.is_enabled(), "Parameter tuner configured");

    // ── Strategy registry ─────────────────────────────────────────────────────
    let registry = RegistryHandle::new(RegistryBuilder::new(cfg.plugin_dir.clone(), tuner));
    let advisor = Advisor::new(registry, cfg.default_enabled.clone(), cfg.auto_reload);
    let listing = advisor.listing().await;
    info!(
        available = ?listing.available,
        enabled = ?listing.enabled,
        "Strategy registry ready"
    );

    // ── HTTP API ──────────────────────────────────────────────────────────────
    api::serve(AppState::new(Arc::new(advisor)), addr).await?;
    info!("Shutdown complete");
    Ok(())
}
