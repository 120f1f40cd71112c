use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use common::{Error, RawStrategyResult, Result};

use crate::features::FeatureRecord;
use crate::{normalize_id, Strategy};

type FeatureFn = dyn Fn(&Value, &FeatureRecord) -> Result<RawStrategyResult> + Send + Sync;
type PayloadFn = dyn Fn(&Value) -> Result<RawStrategyResult> + Send + Sync;

/// Callable behind an in-process strategy. Evaluators that only need the
/// raw request use [`Evaluator::PayloadOnly`].
#[derive(Clone)]
pub enum Evaluator {
    WithFeatures(Arc<FeatureFn>),
    PayloadOnly(Arc<PayloadFn>),
}

impl Evaluator {
    pub fn with_features<F>(f: F) -> Self
    where
        F: Fn(&Value, &FeatureRecord) -> Result<RawStrategyResult> + Send + Sync + 'static,
    {
        Evaluator::WithFeatures(Arc::new(f))
    }

    pub fn payload_only<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<RawStrategyResult> + Send + Sync + 'static,
    {
        Evaluator::PayloadOnly(Arc::new(f))
    }

    fn call(&self, payload: &Value, features: &FeatureRecord) -> Result<RawStrategyResult> {
        match self {
            Evaluator::WithFeatures(f) => f(payload, features),
            Evaluator::PayloadOnly(f) => f(payload),
        }
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluator::WithFeatures(_) => f.write_str("Evaluator::WithFeatures"),
            Evaluator::PayloadOnly(_) => f.write_str("Evaluator::PayloadOnly"),
        }
    }
}

/// A strategy supplied programmatically by the embedding application.
#[derive(Debug, Clone)]
pub struct ExternalStrategy {
    id: String,
    evaluator: Evaluator,
}

impl ExternalStrategy {
    /// Fails when `id` is blank after normalization.
    pub fn new(id: &str, evaluator: Evaluator) -> Result<Self> {
        let id = normalize_id(id);
        if id.is_empty() {
            return Err(Error::Other("external strategy id must not be empty".into()));
        }
        Ok(Self { id, evaluator })
    }
}

#[async_trait]
impl Strategy for ExternalStrategy {
    fn id(&self) -> &str {
        &self.id
    }

    async fn evaluate(&self, payload: &Value, features: &FeatureRecord) -> Result<RawStrategyResult> {
        self.evaluator.call(payload, features)
    }
}
