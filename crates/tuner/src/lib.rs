pub mod client;
pub mod endpoint;
pub mod params;
pub mod prompt;
pub mod response;

pub use client::ChatCompletionOracle;
pub use params::{FilterMode, TuningParameters};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use common::{Result, TunerConfig};

/// Abstraction over the external advisory oracle.
///
/// `ChatCompletionOracle` implements this against a remote endpoint; tests
/// plug in canned oracles.
#[async_trait]
pub trait TuningOracle: Send + Sync {
    /// Ask for a tuning object describing parameter nudges for this payload.
    async fn suggest(&self, payload: &Value) -> Result<Map<String, Value>>;
}

/// Optional parameter nudging for the ai_assisted strategy.
///
/// Never fails: a disabled tuner, a slow oracle, or a malformed reply all
/// yield the default parameters.
#[derive(Clone)]
pub struct ParameterTuner {
    oracle: Option<Arc<dyn TuningOracle>>,
    timeout: Duration,
}

impl ParameterTuner {
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

    pub fn disabled() -> Self {
        Self {
            oracle: None,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_oracle(oracle: Arc<dyn TuningOracle>, timeout: Duration) -> Self {
        Self {
            oracle: Some(oracle),
            timeout,
        }
    }

    /// Build from configuration. Anything short of an explicitly enabled
    /// tuner with a valid endpoint and a credential yields a disabled tuner.
    pub fn from_config(cfg: &TunerConfig) -> Self {
        if !cfg.is_active() {
            info!("Parameter tuner disabled");
            return Self::disabled();
        }
        match ChatCompletionOracle::new(cfg) {
            Ok(oracle) => {
                info!(endpoint = %oracle.endpoint(), model = %cfg.model, "Parameter tuner enabled");
                Self::with_oracle(Arc::new(oracle), cfg.timeout)
            }
            Err(e) => {
                warn!(error = %e, "Parameter tuner misconfigured, running without it");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.oracle.is_some()
    }

    /// Fresh parameters for one evaluation, nudged by the oracle when it answers in time.
    pub async fn tune(&self, payload: &Value) -> TuningParameters {
        let mut params = TuningParameters::default();
        let Some(oracle) = &self.oracle else {
            return params;
        };

        match tokio::time::timeout(self.timeout, oracle.suggest(payload)).await {
            Ok(Ok(tune)) => {
                params.apply(&tune);
                debug!(?params, "Applied tuning");
            }
            Ok(Err(e)) => warn!(error = %e, "Parameter tuner failed, using defaults"),
            Err(_) => warn!(timeout = ?self.timeout, "Parameter tuner timed out, using defaults"),
        }
        params
    }
}

impl Default for ParameterTuner {
    fn default() -> Self {
        Self::disabled()
    }
}
