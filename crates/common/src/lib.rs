pub mod config;
pub mod error;
pub mod json;
pub mod types;

pub use config::{Config, TunerConfig};
pub use error::{Error, Result};
pub use types::*;
