use async_trait::async_trait;
use serde_json::Value;

use common::{Confidence, RawStrategyResult, Result, Signal};
use risk::ExitMultipliers;

use super::{exits, BREAKOUT};
use crate::features::FeatureRecord;
use crate::Strategy;

const MULT: ExitMultipliers = ExitMultipliers::new(1.8, 3.0);

const MIN_ATR_RATIO: f64 = 0.004;
const MIN_RANGE_PCT: f64 = 0.007;
const MIN_VOLUME_RATIO: f64 = 1.2;
const MIN_MOVE: f64 = 0.35;

/// Follows strong moves once volatility and volume have expanded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Breakout;

impl Breakout {
    pub fn direction(f: &FeatureRecord) -> (Signal, f64) {
        let expanded = f.atr_ratio >= MIN_ATR_RATIO
            && f.range_pct >= MIN_RANGE_PCT
            && f.volume_ratio >= MIN_VOLUME_RATIO;
        if !expanded {
            return (Signal::Hold, 0.0);
        }

        let edge = 15.0 + (f.price_change.abs() * 3.0).clamp(0.0, 8.0);
        if f.price_change > MIN_MOVE {
            (Signal::Buy, edge)
        } else if f.price_change < -MIN_MOVE {
            (Signal::Sell, edge)
        } else {
            (Signal::Hold, 0.0)
        }
    }

    pub fn decide(f: &FeatureRecord) -> RawStrategyResult {
        if !f.has_valid_price() {
            return RawStrategyResult::invalid_price(BREAKOUT);
        }
        let (signal, edge) = Self::direction(f);
        let levels = exits(f, signal, MULT);
        RawStrategyResult::decided(
            signal,
            Confidence::from_edge(edge),
            format!(
                "breakout: atr%={:.2}, range%={:.2}, vol={:.2}",
                f.atr_ratio * 100.0,
                f.range_pct * 100.0,
                f.volume_ratio
            ),
            levels.stop_loss,
            levels.take_profit,
            BREAKOUT,
        )
    }
}

#[async_trait]
impl Strategy for Breakout {
    fn id(&self) -> &str {
        BREAKOUT
    }

    async fn evaluate(&self, _payload: &Value, features: &FeatureRecord) -> Result<RawStrategyResult> {
        Ok(Self::decide(features))
    }
}
