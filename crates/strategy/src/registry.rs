use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use tuner::ParameterTuner;

use crate::builtin;
use crate::external::ExternalStrategy;
use crate::plugin;
use crate::{normalize_id, Strategy};

/// Most strategies evaluated for one request.
pub const MAX_ENABLED: usize = 3;

/// Immutable id → strategy mapping. Never mutated after construction;
/// reloading builds a fresh one.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    /// Insert, replacing any strategy already registered under the same id.
    pub fn insert(&mut self, strategy: Arc<dyn Strategy>) {
        self.strategies.insert(strategy.id().to_string(), strategy);
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Strategy>> {
        self.strategies.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.strategies.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.strategies.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Pick the strategies to run for one request.
    ///
    /// `requested` (from the request body) wins when it names at least one
    /// known id; otherwise `configured` defaults; otherwise the built-in
    /// order. Unknown ids are dropped, duplicates removed, and the result is
    /// capped at [`MAX_ENABLED`].
    pub fn resolve_enabled(&self, requested: Option<&[String]>, configured: &[String]) -> Vec<String> {
        if let Some(ids) = requested {
            let picked = self.known_prefix(ids.iter().map(String::as_str));
            if !picked.is_empty() {
                return picked;
            }
        }
        let picked = self.known_prefix(configured.iter().map(String::as_str));
        if !picked.is_empty() {
            return picked;
        }
        self.known_prefix(builtin::DEFAULT_ORDER.into_iter())
    }

    fn known_prefix<'a>(&self, ids: impl Iterator<Item = &'a str>) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(MAX_ENABLED);
        for id in ids.map(normalize_id) {
            if out.len() == MAX_ENABLED {
                break;
            }
            if self.contains(&id) && !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}

/// The `enabled_strategies` list of a request body, if it carries one.
pub fn requested_ids(payload: &Value) -> Option<Vec<String>> {
    let ids = payload.get("enabled_strategies")?.as_array()?;
    Some(
        ids.iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .filter(|s| !s.trim().is_empty())
            .collect(),
    )
}

/// Recipe for a registry: built-ins, then plugins from `plugin_dir`, then
/// in-process external strategies. Later sources shadow earlier ones.
#[derive(Clone)]
pub struct RegistryBuilder {
    plugin_dir: PathBuf,
    tuner: ParameterTuner,
    external: Vec<Arc<ExternalStrategy>>,
}

impl RegistryBuilder {
    pub fn new(plugin_dir: impl Into<PathBuf>, tuner: ParameterTuner) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
            tuner,
            external: Vec::new(),
        }
    }

    pub fn with_external(mut self, strategy: ExternalStrategy) -> Self {
        self.external.push(Arc::new(strategy));
        self
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    pub fn build(&self) -> StrategyRegistry {
        let mut registry = StrategyRegistry::default();
        for strategy in builtin::all(&self.tuner) {
            registry.insert(strategy);
        }
        let plugins = plugin::discover(&self.plugin_dir);
        let plugin_count = plugins.len();
        for strategy in plugins {
            registry.insert(Arc::new(strategy));
        }
        for strategy in &self.external {
            registry.insert(strategy.clone());
        }
        info!(
            strategies = registry.len(),
            plugins = plugin_count,
            external = self.external.len(),
            "Strategy registry built"
        );
        registry
    }
}

/// Shared handle to the current registry. Readers get a cheap `Arc` clone;
/// [`reload`](Self::reload) builds a complete new registry before swapping
/// it in, so readers never observe a partial one.
pub struct RegistryHandle {
    builder: RegistryBuilder,
    current: RwLock<Arc<StrategyRegistry>>,
}

impl RegistryHandle {
    pub fn new(builder: RegistryBuilder) -> Self {
        let registry = Arc::new(builder.build());
        Self {
            builder,
            current: RwLock::new(registry),
        }
    }

    pub async fn current(&self) -> Arc<StrategyRegistry> {
        self.current.read().await.clone()
    }

    pub async fn reload(&self) -> Arc<StrategyRegistry> {
        let fresh = Arc::new(self.builder.build());
        *self.current.write().await = fresh.clone();
        fresh
    }

    pub fn builder(&self) -> &RegistryBuilder {
        &self.builder
    }
}
