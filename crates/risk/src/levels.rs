use common::Signal;

/// Stop/target distance multipliers applied to the volatility unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitMultipliers {
    pub stop: f64,
    pub target: f64,
}

impl ExitMultipliers {
    pub const fn new(stop: f64, target: f64) -> Self {
        Self { stop, target }
    }
}

impl Default for ExitMultipliers {
    fn default() -> Self {
        Self::new(1.6, 2.2)
    }
}

/// Protective stop and profit target for one decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitLevels {
    pub stop_loss: f64,
    pub take_profit: f64,
}

impl ExitLevels {
    pub const ZERO: ExitLevels = ExitLevels {
        stop_loss: 0.0,
        take_profit: 0.0,
    };

    /// Levels placed `mult · atr` away from `price` in the trade's direction.
    ///
    /// HOLD ignores the multipliers and uses a symmetric ±1 ATR placeholder.
    /// Both levels are rounded to 4 decimal places.
    pub fn around(price: f64, atr: f64, signal: Signal, mult: ExitMultipliers) -> Self {
        let (stop_loss, take_profit) = match signal {
            Signal::Buy => (price - mult.stop * atr, price + mult.target * atr),
            Signal::Sell => (price + mult.stop * atr, price - mult.target * atr),
            Signal::Hold => (price - atr, price + atr),
        };
        Self {
            stop_loss: round4(stop_loss),
            take_profit: round4(take_profit),
        }
    }
}

/// Round to 4 decimal places.
pub fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}
