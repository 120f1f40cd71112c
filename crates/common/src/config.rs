use std::path::PathBuf;
use std::time::Duration;

/// All configuration loaded from environment variables at startup.
/// Every key is optional; unparsable values fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    // Listener
    pub listen_host: String,
    pub listen_port: u16,

    // Strategy registry
    pub plugin_dir: PathBuf,
    /// Default enabled strategy ids when a request names none.
    pub default_enabled: Vec<String>,
    /// Rebuild the registry on every access instead of only on reload.
    pub auto_reload: bool,

    // Parameter tuner
    pub tuner: TunerConfig,
}

/// Settings for the optional external parameter tuner.
#[derive(Debug, Clone)]
pub struct TunerConfig {
    pub enabled: bool,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl TunerConfig {
    const DEFAULT_MODEL: &'static str = "chat-model";
    const DEFAULT_TIMEOUT_SECS: f64 = 8.0;

    /// The tuner only runs when switched on and given both an endpoint and a credential.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.api_key.is_empty() && !self.base_url.is_empty()
    }
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            base_url: String::new(),
            model: Self::DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs_f64(Self::DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let timeout = get("STRATEGY_LLM_TIMEOUT_SEC")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| *v > 0.0)
            .and_then(|v| Duration::try_from_secs_f64(v).ok())
            .unwrap_or(Duration::from_secs_f64(TunerConfig::DEFAULT_TIMEOUT_SECS));

        let tuner = TunerConfig {
            enabled: get("STRATEGY_LLM_ENABLED")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            api_key: get("AI_API_KEY").unwrap_or_default(),
            base_url: get("AI_BASE_URL").unwrap_or_default(),
            model: get("AI_MODEL").unwrap_or_else(|| TunerConfig::DEFAULT_MODEL.to_string()),
            timeout,
        };

        Config {
            listen_host: get("ADVISOR_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            listen_port: get("ADVISOR_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(9000),
            plugin_dir: get("STRATEGY_PLUGIN_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("user_strategies")),
            default_enabled: get("STRATEGY_ENABLED")
                .map(|v| parse_id_list(&v))
                .unwrap_or_default(),
            auto_reload: get("STRATEGY_AUTO_RELOAD")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            tuner,
        }
    }
}

fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
