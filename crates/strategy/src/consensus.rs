use common::{Advisory, Confidence, ConsensusResult, RawStrategyResult, Signal, StrategyResult, Summary};
use risk::normalize;

/// Weighted vote across normalized results.
///
/// A side wins only if it strictly outweighs the other side and is at least
/// as heavy as HOLD; every other case resolves to HOLD.
pub fn summarize(items: &[StrategyResult]) -> Summary {
    let mut summary = Summary {
        strategy_count: items.len(),
        ..Summary::default()
    };
    for item in items {
        let w = item.confidence.weight();
        match item.signal {
            Signal::Buy => summary.buy_weight += w,
            Signal::Sell => summary.sell_weight += w,
            Signal::Hold => summary.hold_weight += w,
        }
    }

    let (buy, sell, hold) = (summary.buy_weight, summary.sell_weight, summary.hold_weight);
    summary.consensus = if buy > sell && buy >= hold {
        Signal::Buy
    } else if sell > buy && sell >= hold {
        Signal::Sell
    } else {
        Signal::Hold
    };
    summary
}

/// The result whose exit levels and confidence the consensus reuses.
///
/// Candidates are the results agreeing with `consensus` (every result when
/// it is HOLD). Highest confidence wins; ties go to the greatest
/// `strategy_id`.
pub fn anchor(items: &[StrategyResult], consensus: Signal) -> Option<&StrategyResult> {
    items
        .iter()
        .filter(|r| consensus == Signal::Hold || r.signal == consensus)
        .max_by(|a, b| {
            (a.confidence, a.strategy_id.as_deref().unwrap_or_default())
                .cmp(&(b.confidence, b.strategy_id.as_deref().unwrap_or_default()))
        })
}

/// Collapse an advisory into one decision, normalized against `price`.
pub fn consensus(advisory: Advisory, price: f64) -> ConsensusResult {
    let summary = &advisory.summary;
    let Some(best) = anchor(&advisory.strategies, summary.consensus) else {
        return no_strategy(advisory);
    };

    let signal = summary.consensus;
    let raw = RawStrategyResult::decided(
        signal,
        best.confidence,
        format!(
            "consensus={signal}, buy={}, sell={}, hold={}, anchor={}: {}",
            summary.buy_weight,
            summary.sell_weight,
            summary.hold_weight,
            best.strategy_id.as_deref().unwrap_or("-"),
            best.reason
        ),
        best.stop_loss,
        best.take_profit,
        format!("consensus_{}", signal.as_str().to_lowercase()),
    );

    ConsensusResult {
        result: normalize(raw, price, "consensus"),
        advisory,
    }
}

/// Nothing ran: HOLD with zero levels, deliberately left un-normalized.
fn no_strategy(advisory: Advisory) -> ConsensusResult {
    ConsensusResult {
        result: StrategyResult {
            strategy_id: None,
            signal: Signal::Hold,
            reason: "no strategy available".into(),
            stop_loss: 0.0,
            take_profit: 0.0,
            confidence: Confidence::Low,
            strategy_combo: "no_trade".into(),
        },
        advisory,
    }
}
