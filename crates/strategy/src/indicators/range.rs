use crate::features::CandleRow;

/// Recent high-low spread relative to the last close.
#[derive(Debug, Clone)]
pub struct RangeIndicator {
    pub lookback: usize,
}

impl RangeIndicator {
    pub const DEFAULT_LOOKBACK: usize = 8;

    pub fn new(lookback: usize) -> Self {
        assert!(lookback >= 1, "range lookback must be >= 1");
        Self { lookback }
    }

    /// `(max high - min low) / last close` over the most recent `lookback`
    /// rows. Returns 0 with no rows.
    pub fn compute(&self, rows: &[CandleRow]) -> f64 {
        let skip = rows.len().saturating_sub(self.lookback);
        let recent = &rows[skip..];
        let Some(last) = recent.last() else {
            return 0.0;
        };
        if last.close <= 0.0 {
            return 0.0;
        }

        let high = recent.iter().map(|r| r.high).fold(f64::MIN, f64::max);
        let low = recent.iter().map(|r| r.low).fold(f64::MAX, f64::min);
        (high - low) / last.close
    }
}

impl Default for RangeIndicator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LOOKBACK)
    }
}
