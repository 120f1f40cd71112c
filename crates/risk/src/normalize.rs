use common::{RawStrategyResult, Signal, StrategyResult};
use tracing::debug;

use crate::levels::{round4, ExitLevels, ExitMultipliers};

/// Longest reason text carried by a canonical result, in characters.
pub const MAX_REASON_CHARS: usize = 240;

/// Fraction of price used as the volatility unit when a result arrives
/// without usable exit levels.
const FALLBACK_ATR_FRACTION: f64 = 0.005;
const MIN_FALLBACK_ATR: f64 = 1e-8;
/// Upper bound on the fallback unit, so the stop stays above zero.
const MAX_FALLBACK_ATR_FRACTION: f64 = 0.5;

/// Sanitize a raw strategy result into the canonical shape.
///
/// Missing signal/confidence default to HOLD/LOW. When `price > 0` and
/// either level is non-positive, both levels are recomputed around `price`
/// using the symmetric HOLD placeholder. With a non-positive price the
/// levels are left as supplied, so invalid-price results keep zero targets.
pub fn normalize(raw: RawStrategyResult, price: f64, default_combo: &str) -> StrategyResult {
    let signal = raw.signal.unwrap_or_default();
    let confidence = raw.confidence.unwrap_or_default();

    let mut stop_loss = round4(finite_or_zero(raw.stop_loss));
    let mut take_profit = round4(finite_or_zero(raw.take_profit));
    if price > 0.0 && (stop_loss <= 0.0 || take_profit <= 0.0) {
        let levels = fallback_levels(price);
        debug!(
            signal = %signal,
            stop_loss = levels.stop_loss,
            take_profit = levels.take_profit,
            "Filled missing exit levels"
        );
        stop_loss = levels.stop_loss;
        take_profit = levels.take_profit;
    }

    StrategyResult {
        strategy_id: None,
        signal,
        reason: truncate_chars(raw.reason.as_deref().unwrap_or_default(), MAX_REASON_CHARS),
        stop_loss,
        take_profit,
        confidence,
        strategy_combo: raw
            .strategy_combo
            .unwrap_or_else(|| default_combo.to_string()),
    }
}

/// Symmetric placeholder around a positive `price`.
///
/// Prices below the 4-dp tick would round to zero, so those levels keep
/// full precision instead.
fn fallback_levels(price: f64) -> ExitLevels {
    let atr = (price * FALLBACK_ATR_FRACTION)
        .max(MIN_FALLBACK_ATR)
        .min(price * MAX_FALLBACK_ATR_FRACTION);
    let rounded = ExitLevels::around(price, atr, Signal::Hold, ExitMultipliers::default());
    if rounded.stop_loss > 0.0 && rounded.take_profit > 0.0 {
        return rounded;
    }
    ExitLevels {
        stop_loss: price - atr,
        take_profit: price + atr,
    }
}

fn finite_or_zero(v: Option<f64>) -> f64 {
    v.filter(|x| x.is_finite()).unwrap_or(0.0)
}

/// First `max` characters of `s` (not bytes, so multi-byte text never splits).
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
