use crate::features::CandleRow;

/// Average True Range over candle history.
///
/// True range per consecutive pair is
/// `max(high - low, |high - prev_close|, |low - prev_close|)`; the ATR is the
/// plain mean of the last `period` true ranges (or all of them when fewer are
/// available). Returns 0 with fewer than two rows.
#[derive(Debug, Clone)]
pub struct AtrIndicator {
    pub period: usize,
}

impl AtrIndicator {
    pub const DEFAULT_PERIOD: usize = 14;

    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self { period }
    }

    /// Compute ATR from rows ordered oldest first.
    pub fn compute(&self, rows: &[CandleRow]) -> f64 {
        if rows.len() < 2 {
            return 0.0;
        }

        let true_ranges: Vec<f64> = rows
            .windows(2)
            .map(|w| {
                let (prev, cur) = (w[0], w[1]);
                (cur.high - cur.low)
                    .max((cur.high - prev.close).abs())
                    .max((cur.low - prev.close).abs())
            })
            .collect();

        let skip = true_ranges.len().saturating_sub(self.period);
        let recent = &true_ranges[skip..];
        recent.iter().sum::<f64>() / recent.len() as f64
    }
}

impl Default for AtrIndicator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(high: f64, low: f64, close: f64) -> CandleRow {
        CandleRow { open: close, high, low, close }
    }

    #[test]
    fn atr_is_zero_without_two_rows() {
        let atr = AtrIndicator::default();
        assert_eq!(atr.compute(&[]), 0.0);
        assert_eq!(atr.compute(&[row(11.0, 9.0, 10.0)]), 0.0);
    }

    #[test]
    fn gaps_count_toward_true_range() {
        let atr = AtrIndicator::default();
        // Gap up: |high - prev_close| = 15 - 10 = 5 beats high - low = 2.
        let rows = [row(11.0, 9.0, 10.0), row(15.0, 13.0, 14.0)];
        assert!((atr.compute(&rows) - 5.0).abs() < 1e-12);
        // Gap down: |low - prev_close| = 10 - 4 = 6.
        let rows = [row(11.0, 9.0, 10.0), row(6.0, 4.0, 5.0)];
        assert!((atr.compute(&rows) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn only_the_last_period_ranges_are_averaged() {
        let atr = AtrIndicator::new(2);
        let rows = [
            row(100.0, 90.0, 95.0),
            row(96.0, 94.0, 95.0),  // tr 2
            row(97.0, 93.0, 95.0),  // tr 4
            row(98.0, 92.0, 95.0),  // tr 6
        ];
        assert!((atr.compute(&rows) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn fewer_ranges_than_period_uses_all() {
        let atr = AtrIndicator::new(14);
        let rows = [row(96.0, 94.0, 95.0), row(96.0, 94.0, 95.0), row(99.0, 95.0, 95.0)];
        assert!((atr.compute(&rows) - 3.0).abs() < 1e-12);
    }
}
