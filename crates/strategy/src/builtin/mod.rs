//! The four strategies every registry starts with.

mod ai_assisted;
mod breakout;
mod mean_reversion;
mod trend_following;

pub use ai_assisted::{AiAssisted, BiasScores};
pub use breakout::Breakout;
pub use mean_reversion::MeanReversion;
pub use trend_following::TrendFollowing;

use std::sync::Arc;

use common::Signal;
use risk::{ExitLevels, ExitMultipliers};
use tuner::ParameterTuner;

use crate::features::FeatureRecord;
use crate::Strategy;

pub const AI_ASSISTED: &str = "ai_assisted";
pub const TREND_FOLLOWING: &str = "trend_following";
pub const MEAN_REVERSION: &str = "mean_reversion";
pub const BREAKOUT: &str = "breakout";

/// Built-in ids in default enable order.
pub const DEFAULT_ORDER: [&str; 4] = [AI_ASSISTED, TREND_FOLLOWING, MEAN_REVERSION, BREAKOUT];

/// Fresh instances of every built-in, in [`DEFAULT_ORDER`].
pub fn all(tuner: &ParameterTuner) -> Vec<Arc<dyn Strategy>> {
    vec![
        Arc::new(AiAssisted::new(tuner.clone())),
        Arc::new(TrendFollowing),
        Arc::new(MeanReversion),
        Arc::new(Breakout),
    ]
}

/// Exit levels against the record's volatility unit.
pub(crate) fn exits(f: &FeatureRecord, signal: Signal, mult: ExitMultipliers) -> ExitLevels {
    ExitLevels::around(f.price, f.atr_use, signal, mult)
}
