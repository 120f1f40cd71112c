use proptest::prelude::*;
use serde_json::{json, Value};

use common::{RawStrategyResult, Signal};
use strategy::builtin::{AiAssisted, Breakout, MeanReversion, TrendFollowing};
use strategy::registry::MAX_ENABLED;
use strategy::{FeatureRecord, RegistryBuilder};
use tuner::{ParameterTuner, TuningParameters};

/// Loosely-typed JSON leaves, the kind of noise upstream producers send.
fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1e6f64..1e6).prop_map(|v| json!(v)),
        "[a-z0-9.\\-]{0,6}".prop_map(Value::String),
        Just(json!([1, 2, 3])),
        Just(json!({ "nested": true })),
    ]
}

fn noisy_payload() -> impl Strategy<Value = Value> {
    (leaf(), leaf(), leaf(), leaf(), leaf(), leaf(), leaf()).prop_map(
        |(price, rsi, macd, bb, volume, overall, kline)| {
            json!({
                "price_data": {
                    "price": price,
                    "technical": { "rsi": rsi, "macd": macd, "bb_position": bb, "volume_ratio": volume },
                    "trend": { "overall": overall },
                    "kline_data": [kline, { "open": 1, "high": 2, "low": 0.5, "close": 1.5 }]
                }
            })
        },
    )
}

fn builtin_results(f: &FeatureRecord) -> Vec<RawStrategyResult> {
    vec![
        AiAssisted::decide(f, &TuningParameters::default()),
        TrendFollowing::decide(f),
        MeanReversion::decide(f),
        Breakout::decide(f),
    ]
}

proptest! {
    /// Extraction never panics and always yields finite, defaulted numbers.
    #[test]
    fn extraction_never_fails(payload in noisy_payload()) {
        let f = FeatureRecord::extract(&payload);
        for name in FeatureRecord::NUMERIC_FIELDS {
            prop_assert!(f.get(name).unwrap().is_finite(), "{} not finite", name);
        }
        prop_assert!(f.atr >= 0.0);
        prop_assert!(f.range_pct >= 0.0);
    }

    /// A non-positive price short-circuits every built-in to a zero-level HOLD.
    #[test]
    fn invalid_price_short_circuits_every_builtin(
        price in -1e6f64..=0.0,
        rsi in 0.0f64..100.0,
        bb in 0.0f64..1.0,
    ) {
        let f = FeatureRecord::extract(&json!({
            "price_data": { "price": price, "technical": { "rsi": rsi, "bb_position": bb } }
        }));
        for r in builtin_results(&f) {
            prop_assert_eq!(r.signal, Some(Signal::Hold));
            prop_assert_eq!(r.stop_loss, Some(0.0));
            prop_assert_eq!(r.take_profit, Some(0.0));
        }
    }

    /// Directional decisions always place the stop on the losing side of price.
    #[test]
    fn directional_levels_bracket_price(
        price in 1.0f64..100_000.0,
        rsi in 0.0f64..100.0,
        bb in 0.0f64..1.0,
        change in -5.0f64..5.0,
        volume in 0.0f64..3.0,
    ) {
        let f = FeatureRecord::extract(&json!({
            "price_data": {
                "price": price,
                "price_change": change,
                "technical": { "rsi": rsi, "bb_position": bb, "volume_ratio": volume,
                               "sma20": price * 0.98, "sma50": price * 0.95, "macd": 1.0 },
                "kline_data": [
                    { "open": price, "high": price * 1.01, "low": price * 0.99, "close": price },
                    { "open": price, "high": price * 1.01, "low": price * 0.99, "close": price }
                ]
            }
        }));
        for r in builtin_results(&f) {
            let (sl, tp) = (r.stop_loss.unwrap(), r.take_profit.unwrap());
            match r.signal.unwrap() {
                Signal::Buy => prop_assert!(sl < price && price < tp),
                Signal::Sell => prop_assert!(tp < price && price < sl),
                Signal::Hold => prop_assert!(sl <= price && price <= tp),
            }
        }
    }

    /// Selection never exceeds the cap and never names an unknown id.
    #[test]
    fn enabled_selection_is_capped_and_known(
        requested in proptest::option::of(proptest::collection::vec("[a-z_]{0,16}", 0..8)),
        configured in proptest::collection::vec("[a-z_]{0,16}", 0..8),
    ) {
        let registry = RegistryBuilder::new("/nonexistent/plugins", ParameterTuner::disabled()).build();
        let enabled = registry.resolve_enabled(requested.as_deref(), &configured);
        prop_assert!(!enabled.is_empty());
        prop_assert!(enabled.len() <= MAX_ENABLED);
        for id in &enabled {
            prop_assert!(registry.contains(id));
        }
    }
}
