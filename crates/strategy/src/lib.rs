pub mod advisor;
pub mod builtin;
pub mod consensus;
pub mod external;
pub mod features;
pub mod indicators;
pub mod plugin;
pub mod registry;

pub use advisor::{Advisor, StrategyListing};
pub use external::{Evaluator, ExternalStrategy};
pub use features::{CandleRow, FeatureRecord};
pub use plugin::{RuleStrategy, PLUGIN_TEMPLATE, PLUGIN_TEMPLATE_FILENAME};
pub use registry::{RegistryBuilder, RegistryHandle, StrategyRegistry};

use async_trait::async_trait;
use serde_json::Value;

use common::{RawStrategyResult, Result};

/// All strategy implementations must satisfy this trait.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Registry key: lowercase, non-empty.
    fn id(&self) -> &str;

    /// Score one request. `payload` is the raw request document and
    /// `features` the record extracted from it once per request.
    ///
    /// Errors are absorbed by the caller into a HOLD result.
    async fn evaluate(&self, payload: &Value, features: &FeatureRecord) -> Result<RawStrategyResult>;
}

/// Canonical form of a strategy id: trimmed, lowercased, spaces to `_`.
pub fn normalize_id(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}
