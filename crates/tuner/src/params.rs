use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use common::json::number;

/// How strict the volatility gate is before a directional signal is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Strict,
    #[default]
    Normal,
    Loose,
}

impl FilterMode {
    /// Minimum ATR/price ratio required to trade.
    pub fn min_atr_ratio(&self) -> f64 {
        match self {
            FilterMode::Strict => 0.0028,
            FilterMode::Normal => 0.002,
            FilterMode::Loose => 0.0016,
        }
    }

    /// Minimum recent range (high-low over close) required to trade.
    pub fn min_range_pct(&self) -> f64 {
        match self {
            FilterMode::Strict => 0.005,
            FilterMode::Normal => 0.004,
            FilterMode::Loose => 0.003,
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::Strict => write!(f, "strict"),
            FilterMode::Normal => write!(f, "normal"),
            FilterMode::Loose => write!(f, "loose"),
        }
    }
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(FilterMode::Strict),
            "normal" => Ok(FilterMode::Normal),
            "loose" => Ok(FilterMode::Loose),
            other => Err(format!("unknown filter mode '{other}'")),
        }
    }
}

/// Per-request knobs for the ai_assisted strategy. Created fresh with
/// defaults, optionally nudged by the oracle, then discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningParameters {
    /// Points added to the long/short edge, in [-8, 8].
    pub bias_shift: f64,
    /// Minimum |edge| to take a directional position, in [8, 16].
    pub entry_threshold: f64,
    /// Stop distance in ATR units, in [1.2, 2.2].
    pub sl_mult: f64,
    /// Target distance in ATR units, in [1.6, 3.4].
    pub tp_mult: f64,
    pub filter_mode: FilterMode,
    /// Confidence adjustment, one of -1, 0, 1.
    pub confidence_delta: i32,
    pub llm_reason: String,
}

impl Default for TuningParameters {
    fn default() -> Self {
        Self {
            bias_shift: 0.0,
            entry_threshold: 10.0,
            sl_mult: 1.6,
            tp_mult: 2.2,
            filter_mode: FilterMode::Normal,
            confidence_delta: 0,
            llm_reason: String::new(),
        }
    }
}

impl TuningParameters {
    pub const BIAS_SHIFT: (f64, f64) = (-8.0, 8.0);
    pub const ENTRY_THRESHOLD: (f64, f64) = (8.0, 16.0);
    pub const SL_MULT: (f64, f64) = (1.2, 2.2);
    pub const TP_MULT: (f64, f64) = (1.6, 3.4);

    /// Overwrite fields from an oracle response, field by field.
    ///
    /// Absent or non-numeric values keep the current setting; numbers are
    /// clamped to their bounds. `filter_mode` is only accepted when it names
    /// a known mode. `reason` always replaces `llm_reason`.
    pub fn apply(&mut self, tune: &Map<String, Value>) {
        let num = |key: &str| tune.get(key).and_then(number);
        let clamp = |v: f64, (lo, hi): (f64, f64)| v.clamp(lo, hi);

        self.bias_shift = clamp(num("bias_shift").unwrap_or(self.bias_shift), Self::BIAS_SHIFT);
        self.entry_threshold = clamp(
            num("entry_threshold").unwrap_or(self.entry_threshold),
            Self::ENTRY_THRESHOLD,
        );
        self.sl_mult = clamp(num("sl_mult").unwrap_or(self.sl_mult), Self::SL_MULT);
        self.tp_mult = clamp(num("tp_mult").unwrap_or(self.tp_mult), Self::TP_MULT);

        if let Some(mode) = tune
            .get("filter_mode")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<FilterMode>().ok())
        {
            self.filter_mode = mode;
        }

        // Truncates toward zero after clamping, so 0.7 -> 0.
        self.confidence_delta = num("confidence_delta")
            .map(|v| v.clamp(-1.0, 1.0) as i32)
            .unwrap_or(self.confidence_delta);

        self.llm_reason = match tune.get("reason") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(other) => other.to_string(),
        };
    }
}
