use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use common::{Advisory, Confidence, ConsensusResult, RawStrategyResult, Signal};
use risk::{normalize, truncate_chars};

use crate::consensus::{consensus, summarize};
use crate::features::FeatureRecord;
use crate::registry::{requested_ids, RegistryHandle, StrategyRegistry};
use crate::Strategy;

const ERROR_REASON_CHARS: usize = 80;

/// What the registry currently offers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyListing {
    /// Every registered id, sorted.
    pub available: Vec<String>,
    /// Ids a request without `enabled_strategies` would run.
    pub enabled: Vec<String>,
    pub plugin_dir: String,
}

/// Request-level entry points of the advisory engine.
pub struct Advisor {
    registry: RegistryHandle,
    default_enabled: Vec<String>,
    auto_reload: bool,
}

impl Advisor {
    pub fn new(registry: RegistryHandle, default_enabled: Vec<String>, auto_reload: bool) -> Self {
        Self {
            registry,
            default_enabled,
            auto_reload,
        }
    }

    async fn registry(&self) -> Arc<StrategyRegistry> {
        if self.auto_reload {
            self.registry.reload().await
        } else {
            self.registry.current().await
        }
    }

    /// Evaluate every enabled strategy and tally the vote.
    pub async fn advise(&self, payload: &Value) -> Advisory {
        let registry = self.registry().await;
        let requested = requested_ids(payload);
        let enabled = registry.resolve_enabled(requested.as_deref(), &self.default_enabled);
        let features = FeatureRecord::extract(payload);

        let mut strategies = Vec::with_capacity(enabled.len());
        for id in &enabled {
            let Some(strategy) = registry.get(id) else {
                continue;
            };
            let raw = run_guarded(strategy.as_ref(), payload, &features).await;
            let result = normalize(raw, features.price, id).with_strategy_id(id);
            debug!(
                strategy_id = %id,
                signal = %result.signal,
                confidence = %result.confidence,
                "Strategy evaluated"
            );
            strategies.push(result);
        }

        Advisory {
            summary: summarize(&strategies),
            strategies,
            enabled_strategies: enabled,
        }
    }

    /// One consensus decision plus the advisory behind it.
    pub async fn consensus(&self, payload: &Value) -> ConsensusResult {
        let advisory = self.advise(payload).await;
        let price = FeatureRecord::extract(payload).price;
        let out = consensus(advisory, price);
        info!(
            signal = %out.result.signal,
            confidence = %out.result.confidence,
            strategies = out.advisory.strategies.len(),
            "Consensus computed"
        );
        out
    }

    pub async fn listing(&self) -> StrategyListing {
        let registry = self.registry().await;
        StrategyListing {
            available: registry.ids(),
            enabled: registry.resolve_enabled(None, &self.default_enabled),
            plugin_dir: self.registry.builder().plugin_dir().display().to_string(),
        }
    }

    /// Rebuild the registry from scratch; returns the ids now available.
    pub async fn reload(&self) -> Vec<String> {
        let ids = self.registry.reload().await.ids();
        info!(strategies = ids.len(), "Strategy registry reloaded");
        ids
    }

    pub fn plugin_dir(&self) -> PathBuf {
        self.registry.builder().plugin_dir().to_path_buf()
    }
}

/// Evaluate one strategy, turning errors and panics into a HOLD result.
async fn run_guarded(strategy: &dyn Strategy, payload: &Value, features: &FeatureRecord) -> RawStrategyResult {
    let outcome = AssertUnwindSafe(strategy.evaluate(payload, features))
        .catch_unwind()
        .await;
    let message = match outcome {
        Ok(Ok(raw)) => return raw,
        Ok(Err(e)) => e.to_string(),
        Err(panic) => panic_message(panic.as_ref()),
    };
    warn!(strategy_id = %strategy.id(), error = %message, "Strategy evaluation failed");
    RawStrategyResult::decided(
        Signal::Hold,
        Confidence::Low,
        format!("strategy_error: {}", truncate_chars(&message, ERROR_REASON_CHARS)),
        0.0,
        0.0,
        strategy.id(),
    )
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
