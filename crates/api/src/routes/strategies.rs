use std::io::Write;
use std::path::Path;

use axum::{
    body::Bytes,
    extract::{Path as UrlPath, State},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;

use common::Error;
use strategy::plugin::validate_upload_name;
use strategy::{RuleStrategy, Strategy, StrategyListing, PLUGIN_TEMPLATE, PLUGIN_TEMPLATE_FILENAME};

use crate::{ApiError, AppState};

pub fn strategies_router() -> Router<AppState> {
    Router::new()
        .route("/strategies", get(list))
        .route("/strategies/template", get(template))
        .route("/strategies/plugins/:filename", put(upload))
        .route("/strategies/reload", post(reload))
}

async fn list(State(state): State<AppState>) -> Json<StrategyListing> {
    Json(state.advisor.listing().await)
}

async fn template() -> Json<Value> {
    Json(json!({
        "filename": PLUGIN_TEMPLATE_FILENAME,
        "content": PLUGIN_TEMPLATE,
    }))
}

async fn reload(State(state): State<AppState>) -> Json<Value> {
    let available = state.advisor.reload().await;
    Json(json!({ "reloaded": true, "available": available }))
}

/// Store a rule-file plugin, then reload the registry.
///
/// The definition is validated before anything touches the disk, and the
/// file is written through a temp file plus rename so discovery never reads
/// a partial file.
async fn upload(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    validate_upload_name(&filename)?;
    let source = String::from_utf8(body.to_vec())
        .map_err(|_| ApiError::bad_request("plugin must be UTF-8 text"))?;
    let stem = filename.trim_end_matches(".toml");
    let strategy_id = RuleStrategy::parse(&source, stem)?.id().to_string();

    let dir = state.advisor.plugin_dir();
    let dst = dir.join(&filename);
    let target = dst.clone();
    tokio::task::spawn_blocking(move || write_atomically(&dir, &target, source.as_bytes()))
        .await
        .map_err(|e| Error::Other(format!("plugin write task failed: {e}")))??;
    info!(filename = %filename, strategy_id = %strategy_id, "Strategy plugin saved");

    let available = state.advisor.reload().await;
    Ok(Json(json!({
        "message": "uploaded",
        "filename": filename,
        "strategy_id": strategy_id,
        "saved_path": dst.display().to_string(),
        "available": available,
    })))
}

fn write_atomically(dir: &Path, dst: &Path, contents: &[u8]) -> common::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dst).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
