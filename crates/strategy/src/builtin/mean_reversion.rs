use async_trait::async_trait;
use serde_json::Value;

use common::{Confidence, RawStrategyResult, Result, Signal};
use risk::ExitMultipliers;

use super::{exits, MEAN_REVERSION};
use crate::features::FeatureRecord;
use crate::Strategy;

const MULT: ExitMultipliers = ExitMultipliers::new(1.3, 1.9);

/// Fades RSI extremes at the edge of the Bollinger band.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanReversion;

impl MeanReversion {
    pub fn direction(f: &FeatureRecord) -> (Signal, f64) {
        if f.rsi <= 32.0 && f.bb_position <= 0.2 {
            (Signal::Buy, 12.0 + (32.0 - f.rsi) * 0.5)
        } else if f.rsi >= 68.0 && f.bb_position >= 0.8 {
            (Signal::Sell, 12.0 + (f.rsi - 68.0) * 0.5)
        } else {
            (Signal::Hold, 0.0)
        }
    }

    pub fn decide(f: &FeatureRecord) -> RawStrategyResult {
        if !f.has_valid_price() {
            return RawStrategyResult::invalid_price(MEAN_REVERSION);
        }
        let (signal, edge) = Self::direction(f);
        let levels = exits(f, signal, MULT);
        RawStrategyResult::decided(
            signal,
            Confidence::from_edge(edge),
            format!("mean_reversion: rsi={:.1}, bb={:.2}", f.rsi, f.bb_position),
            levels.stop_loss,
            levels.take_profit,
            MEAN_REVERSION,
        )
    }
}

#[async_trait]
impl Strategy for MeanReversion {
    fn id(&self) -> &str {
        MEAN_REVERSION
    }

    async fn evaluate(&self, _payload: &Value, features: &FeatureRecord) -> Result<RawStrategyResult> {
        Ok(Self::decide(features))
    }
}
