use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Trade direction proposed by a strategy or by the consensus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        }
    }

    /// Case-insensitive parse; anything unrecognised is `Hold`.
    pub fn parse_or_hold(raw: &str) -> Self {
        raw.parse().unwrap_or(Signal::Hold)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Signal::Buy),
            "SELL" => Ok(Signal::Sell),
            "HOLD" => Ok(Signal::Hold),
            other => Err(format!("unknown signal '{other}'")),
        }
    }
}

/// Ordinal confidence label. The derived ordering `Low < Medium < High` is
/// used for weighting and tie-breaking.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    #[default]
    Low,
    Medium,
    High,
}

impl Confidence {
    const ORDER: [Confidence; 3] = [Confidence::Low, Confidence::Medium, Confidence::High];

    /// Vote weight used by the consensus tally.
    pub fn weight(&self) -> u32 {
        match self {
            Confidence::High => 3,
            Confidence::Medium => 2,
            Confidence::Low => 1,
        }
    }

    /// Map an edge score to a label by absolute magnitude.
    pub fn from_edge(edge: f64) -> Self {
        let a = edge.abs();
        if a >= 18.0 {
            Confidence::High
        } else if a >= 10.0 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    /// Move `delta` steps along the ordinal scale, saturating at both ends.
    pub fn shift(self, delta: i32) -> Self {
        let idx = (self as i32 + delta).clamp(0, 2) as usize;
        Self::ORDER[idx]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "LOW",
            Confidence::Medium => "MEDIUM",
            Confidence::High => "HIGH",
        }
    }

    /// Case-insensitive parse; anything unrecognised is `Low`.
    pub fn parse_or_low(raw: &str) -> Self {
        raw.parse().unwrap_or(Confidence::Low)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Confidence::Low),
            "MEDIUM" => Ok(Confidence::Medium),
            "HIGH" => Ok(Confidence::High),
            other => Err(format!("unknown confidence '{other}'")),
        }
    }
}

/// What a strategy hands back before normalization. Every field may be
/// missing; the normalizer fills the gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStrategyResult {
    #[serde(default)]
    pub signal: Option<Signal>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub take_profit: Option<f64>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    #[serde(default)]
    pub strategy_combo: Option<String>,
}

impl RawStrategyResult {
    /// Fully populated result.
    pub fn decided(
        signal: Signal,
        confidence: Confidence,
        reason: impl Into<String>,
        stop_loss: f64,
        take_profit: f64,
        combo: impl Into<String>,
    ) -> Self {
        Self {
            signal: Some(signal),
            reason: Some(reason.into()),
            stop_loss: Some(stop_loss),
            take_profit: Some(take_profit),
            confidence: Some(confidence),
            strategy_combo: Some(combo.into()),
        }
    }

    /// Short-circuit result for a non-positive price: HOLD with zero targets.
    pub fn invalid_price(combo: impl Into<String>) -> Self {
        Self::decided(Signal::Hold, Confidence::Low, "invalid price", 0.0, 0.0, combo)
    }
}

/// Canonical, sanitized strategy output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_id: Option<String>,
    pub signal: Signal,
    pub reason: String,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub confidence: Confidence,
    pub strategy_combo: String,
}

impl StrategyResult {
    pub fn with_strategy_id(mut self, id: impl Into<String>) -> Self {
        self.strategy_id = Some(id.into());
        self
    }
}

/// Weighted vote tally across one advisory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub buy_weight: u32,
    pub sell_weight: u32,
    pub hold_weight: u32,
    pub consensus: Signal,
    pub strategy_count: usize,
}

/// Every enabled strategy's normalized result, in enabled order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub strategies: Vec<StrategyResult>,
    pub summary: Summary,
    pub enabled_strategies: Vec<String>,
}

/// Single consensus decision plus the advisory it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    #[serde(flatten)]
    pub result: StrategyResult,
    pub advisory: Advisory,
}
