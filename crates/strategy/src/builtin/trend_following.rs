use async_trait::async_trait;
use serde_json::Value;

use common::{Confidence, RawStrategyResult, Result, Signal};
use risk::ExitMultipliers;

use super::{exits, TREND_FOLLOWING};
use crate::features::FeatureRecord;
use crate::Strategy;

const MULT: ExitMultipliers = ExitMultipliers::new(1.7, 2.5);

/// Stacked moving averages confirmed by MACD.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendFollowing;

impl TrendFollowing {
    /// Direction and edge. Edge is 14 plus up to 6 points of volume surge.
    pub fn direction(f: &FeatureRecord) -> (Signal, f64) {
        let volume_bonus = ((f.volume_ratio - 1.0) * 6.0).clamp(0.0, 6.0);
        if f.price > f.sma20 && f.sma20 > f.sma50 && f.macd >= f.macd_signal {
            (Signal::Buy, 14.0 + volume_bonus)
        } else if f.price < f.sma20 && f.sma20 < f.sma50 && f.macd <= f.macd_signal {
            (Signal::Sell, 14.0 + volume_bonus)
        } else {
            (Signal::Hold, 0.0)
        }
    }

    pub fn decide(f: &FeatureRecord) -> RawStrategyResult {
        if !f.has_valid_price() {
            return RawStrategyResult::invalid_price(TREND_FOLLOWING);
        }
        let (signal, edge) = Self::direction(f);
        let levels = exits(f, signal, MULT);
        RawStrategyResult::decided(
            signal,
            Confidence::from_edge(edge),
            format!("trend_following: sma20/sma50 + macd, vol={:.2}", f.volume_ratio),
            levels.stop_loss,
            levels.take_profit,
            TREND_FOLLOWING,
        )
    }
}

#[async_trait]
impl Strategy for TrendFollowing {
    fn id(&self) -> &str {
        TREND_FOLLOWING
    }

    async fn evaluate(&self, _payload: &Value, features: &FeatureRecord) -> Result<RawStrategyResult> {
        Ok(Self::decide(features))
    }
}
