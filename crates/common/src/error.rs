use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Tuner error: {0}")]
    Tuner(String),

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Plugin parse error: {0}")]
    PluginParse(#[from] toml::de::Error),

    #[error("Invalid plugin '{name}': {reason}")]
    InvalidPlugin { name: String, reason: String },

    #[error("Strategy '{id}' failed: {reason}")]
    Strategy { id: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn strategy(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Strategy {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_plugin(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPlugin {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
