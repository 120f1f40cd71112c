use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use common::{Confidence, RawStrategyResult, Result, Signal};
use risk::{truncate_chars, ExitMultipliers};
use tuner::{ParameterTuner, TuningParameters};

use super::{exits, AI_ASSISTED, BREAKOUT, MEAN_REVERSION, TREND_FOLLOWING};
use crate::features::FeatureRecord;
use crate::Strategy;

const LLM_REASON_CHARS: usize = 80;

/// The four bounded sub-scores behind the ai_assisted long/short split.
/// Each lies in `[0, 1]`; 0.5 is neutral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiasScores {
    pub trend: f64,
    pub momentum: f64,
    pub volpos: f64,
    pub volume: f64,
}

impl BiasScores {
    pub fn compute(f: &FeatureRecord) -> Self {
        let mut trend: f64 = 0.5;
        if f.is_bullish_trend() {
            trend += 0.25;
        }
        if f.is_bearish_trend() {
            trend -= 0.25;
        }
        trend += ma_bias(f.price, f.sma20);
        trend += ma_bias(f.price, f.sma50);

        let mut momentum: f64 = 0.5;
        momentum += ((f.macd - f.macd_signal) * 1000.0).clamp(-0.20, 0.20);
        if f.rsi <= 30.0 {
            momentum += 0.08;
        } else if f.rsi >= 70.0 {
            momentum -= 0.08;
        }
        momentum += (f.price_change / 10.0).clamp(-0.12, 0.12);

        let mut volpos: f64 = 0.5;
        volpos += ((0.5 - f.bb_position) * 0.5).clamp(-0.15, 0.15);
        volpos += ((f.range_pct - 0.012) * 4.0).clamp(-0.12, 0.12);

        Self {
            trend: trend.clamp(0.0, 1.0),
            momentum: momentum.clamp(0.0, 1.0),
            volpos: volpos.clamp(0.0, 1.0),
            volume: (0.5 + (f.volume_ratio - 1.0) * 0.3).clamp(0.0, 1.0),
        }
    }

    /// Weighted long score in `[0, 100]`.
    pub fn long_score(&self) -> f64 {
        self.trend * 40.0 + self.momentum * 30.0 + self.volpos * 20.0 + self.volume * 10.0
    }

    pub fn short_score(&self) -> f64 {
        100.0 - self.long_score()
    }

    /// Long minus short, before any tuning.
    pub fn edge(&self) -> f64 {
        self.long_score() - self.short_score()
    }
}

/// ±0.10 when price sits clearly above/below a positive moving average.
fn ma_bias(price: f64, ma: f64) -> f64 {
    if ma <= 0.0 {
        0.0
    } else if price > ma {
        0.10
    } else if price < ma {
        -0.10
    } else {
        0.0
    }
}

/// Composite scorer: weighted bias sub-scores, a volatility gate, and
/// optional bounded nudges from the parameter tuner.
#[derive(Clone, Default)]
pub struct AiAssisted {
    tuner: ParameterTuner,
}

impl AiAssisted {
    pub fn new(tuner: ParameterTuner) -> Self {
        Self { tuner }
    }

    /// Pure decision for a given set of tuning parameters.
    pub fn decide(f: &FeatureRecord, params: &TuningParameters) -> RawStrategyResult {
        if !f.has_valid_price() {
            return RawStrategyResult::invalid_price(AI_ASSISTED);
        }

        let bias = BiasScores::compute(f);
        let edge = bias.edge() + params.bias_shift;

        let mode = params.filter_mode;
        let signal = if f.atr_ratio < mode.min_atr_ratio() || f.range_pct < mode.min_range_pct() {
            Signal::Hold
        } else if edge >= params.entry_threshold {
            Signal::Buy
        } else if edge <= -params.entry_threshold {
            Signal::Sell
        } else {
            Signal::Hold
        };

        let confidence = Confidence::from_edge(edge).shift(params.confidence_delta);
        let mult = match confidence {
            Confidence::High => ExitMultipliers::new(params.sl_mult.max(1.8), params.tp_mult.max(2.8)),
            Confidence::Low => ExitMultipliers::new(params.sl_mult.min(1.4), params.tp_mult.min(2.0)),
            Confidence::Medium => ExitMultipliers::new(params.sl_mult, params.tp_mult),
        };
        let levels = exits(f, signal, mult);

        let mut reason = format!(
            "L{:.1}/S{:.1}, edge={:.1}, trend={:.2}, mom={:.2}, atr%={:.2}",
            bias.long_score(),
            bias.short_score(),
            edge,
            bias.trend,
            bias.momentum,
            f.atr_ratio * 100.0
        );
        if !params.llm_reason.is_empty() {
            reason.push_str("; llm=");
            reason.push_str(&truncate_chars(&params.llm_reason, LLM_REASON_CHARS));
        }

        RawStrategyResult::decided(
            signal,
            confidence,
            reason,
            levels.stop_loss,
            levels.take_profit,
            combo(signal, &bias, f),
        )
    }
}

/// Label describing which regime the decision most resembles.
fn combo(signal: Signal, bias: &BiasScores, f: &FeatureRecord) -> &'static str {
    if signal == Signal::Hold {
        "no_trade"
    } else if f.atr_ratio > 0.012 && bias.trend > 0.55 {
        BREAKOUT
    } else if (f.rsi < 35.0 && f.bb_position < 0.25) || (f.rsi > 65.0 && f.bb_position > 0.75) {
        MEAN_REVERSION
    } else {
        TREND_FOLLOWING
    }
}

#[async_trait]
impl Strategy for AiAssisted {
    fn id(&self) -> &str {
        AI_ASSISTED
    }

    async fn evaluate(&self, payload: &Value, features: &FeatureRecord) -> Result<RawStrategyResult> {
        if !features.has_valid_price() {
            return Ok(RawStrategyResult::invalid_price(AI_ASSISTED));
        }
        let params = self.tuner.tune(payload).await;
        let result = Self::decide(features, &params);
        debug!(
            signal = ?result.signal,
            confidence = ?result.confidence,
            bias_shift = params.bias_shift,
            filter_mode = %params.filter_mode,
            "ai_assisted decided"
        );
        Ok(result)
    }
}
