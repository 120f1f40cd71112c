use std::fs;
use std::path::Path;

use serde_json::{json, Value};

use common::{Confidence, Error, RawStrategyResult, Signal};
use strategy::{Advisor, Evaluator, ExternalStrategy, RegistryBuilder, RegistryHandle};
use tuner::ParameterTuner;

fn advisor_in(dir: &Path) -> Advisor {
    advisor_with(RegistryBuilder::new(dir, ParameterTuner::disabled()), Vec::new(), false)
}

fn advisor_with(builder: RegistryBuilder, defaults: Vec<String>, auto_reload: bool) -> Advisor {
    Advisor::new(RegistryHandle::new(builder), defaults, auto_reload)
}

/// Flat candles: ATR 2.0 and a 2% range around a 100 price.
fn candles() -> Value {
    let row = json!({ "open": 100, "high": 101, "low": 99, "close": 100 });
    Value::Array(vec![row; 10])
}

fn payload(price: f64, technical: Value, enabled: &[&str]) -> Value {
    json!({
        "price_data": { "price": price, "technical": technical },
        "enabled_strategies": enabled,
    })
}

#[tokio::test]
async fn neutral_market_holds_everywhere() {
    let dir = tempfile::tempdir().unwrap();
    let advisor = advisor_in(dir.path());
    let body = payload(
        100.0,
        json!({ "rsi": 50, "macd": 0, "macd_signal": 0, "sma20": 100, "sma50": 100,
                "bb_position": 0.5, "volume_ratio": 1 }),
        &[],
    );

    let advisory = advisor.advise(&body).await;
    assert_eq!(
        advisory.enabled_strategies,
        vec!["ai_assisted", "trend_following", "mean_reversion"]
    );
    assert!(advisory.strategies.iter().all(|s| s.signal == Signal::Hold));
    assert!(advisory.strategies.iter().all(|s| s.stop_loss > 0.0 && s.take_profit > 0.0));
    assert_eq!(advisory.summary.hold_weight, 3);
    assert_eq!(advisory.summary.consensus, Signal::Hold);
    assert_eq!(advisory.strategies[0].strategy_id.as_deref(), Some("ai_assisted"));
}

#[tokio::test]
async fn trend_setup_reaches_buy_consensus() {
    let dir = tempfile::tempdir().unwrap();
    let advisor = advisor_in(dir.path());
    let body = payload(
        100.0,
        json!({ "sma20": 95, "sma50": 90, "macd": 1, "macd_signal": 0 }),
        &["trend_following"],
    );

    let out = advisor.consensus(&body).await;
    assert_eq!(out.advisory.enabled_strategies, vec!["trend_following"]);
    assert_eq!(out.result.signal, Signal::Buy);
    assert_eq!(out.result.confidence, Confidence::Medium);
    assert!(out.result.stop_loss < 100.0 && 100.0 < out.result.take_profit);
    assert_eq!(out.result.strategy_combo, "consensus_buy");
    assert!(out.result.reason.starts_with("consensus=BUY, buy=2, sell=0, hold=0, anchor=trend_following"));
    assert_eq!(out.result.strategy_id, None);
}

#[tokio::test]
async fn oversold_payload_with_candles_runs_requested_strategies() {
    let dir = tempfile::tempdir().unwrap();
    let advisor = advisor_in(dir.path());
    let mut body = payload(
        50.0,
        json!({ "rsi": 20, "bb_position": 0.1 }),
        &["mean_reversion", "breakout"],
    );
    body["price_data"]["kline_data"] = json!([
        { "open": 50, "high": 50.5, "low": 49.5, "close": 50 },
        { "open": 50, "high": 50.5, "low": 49.5, "close": 50 }
    ]);

    let advisory = advisor.advise(&body).await;
    let mr = &advisory.strategies[0];
    assert_eq!(mr.strategy_id.as_deref(), Some("mean_reversion"));
    assert_eq!(mr.signal, Signal::Buy);
    assert_eq!(mr.confidence, Confidence::High);
    // ATR 1.0 from the candles.
    assert_eq!(mr.stop_loss, 48.7);
    assert_eq!(mr.take_profit, 51.9);

    // Volume ratio 1.0 keeps breakout out.
    assert_eq!(advisory.strategies[1].signal, Signal::Hold);
    assert_eq!(advisory.summary.buy_weight, 3);
    assert_eq!(advisory.summary.consensus, Signal::Buy);
}

#[tokio::test]
async fn breakout_fires_on_expanded_volatility() {
    let dir = tempfile::tempdir().unwrap();
    let advisor = advisor_in(dir.path());
    let mut body = payload(100.0, json!({ "volume_ratio": 1.5 }), &["breakout"]);
    body["price_data"]["price_change"] = json!(0.5);
    body["price_data"]["kline_data"] = candles();

    let out = advisor.consensus(&body).await;
    let breakout = &out.advisory.strategies[0];
    assert_eq!(breakout.signal, Signal::Buy);
    assert_eq!(breakout.confidence, Confidence::Medium);
    assert_eq!(out.result.signal, Signal::Buy);
    assert_eq!(out.result.stop_loss, 96.4);
    assert_eq!(out.result.take_profit, 106.0);
}

#[tokio::test]
async fn invalid_price_keeps_zero_levels_through_consensus() {
    let dir = tempfile::tempdir().unwrap();
    let advisor = advisor_in(dir.path());
    let body = payload(0.0, json!({}), &["ai_assisted", "trend_following", "breakout"]);

    let out = advisor.consensus(&body).await;
    for s in &out.advisory.strategies {
        assert_eq!(s.signal, Signal::Hold);
        assert_eq!(s.reason, "invalid price");
        assert_eq!((s.stop_loss, s.take_profit), (0.0, 0.0));
        assert_eq!(s.strategy_combo, s.strategy_id.clone().unwrap());
    }
    assert_eq!(out.result.signal, Signal::Hold);
    assert_eq!(out.result.stop_loss, 0.0);
}

#[tokio::test]
async fn failing_strategies_become_hold_results() {
    let dir = tempfile::tempdir().unwrap();
    let builder = RegistryBuilder::new(dir.path(), ParameterTuner::disabled())
        .with_external(
            ExternalStrategy::new(
                "erroring",
                Evaluator::payload_only(|_| Err(Error::strategy("erroring", "x".repeat(200)))),
            )
            .unwrap(),
        )
        .with_external(
            ExternalStrategy::new(
                "panicking",
                Evaluator::with_features(|_, _| panic!("division by zero in user code")),
            )
            .unwrap(),
        );
    let advisor = advisor_with(builder, Vec::new(), false);
    let body = payload(100.0, json!({}), &["erroring", "panicking", "mean_reversion"]);

    let advisory = advisor.advise(&body).await;
    assert_eq!(advisory.strategies.len(), 3);

    let erroring = &advisory.strategies[0];
    assert_eq!(erroring.strategy_id.as_deref(), Some("erroring"));
    assert_eq!(erroring.signal, Signal::Hold);
    assert!(erroring.reason.starts_with("strategy_error: Strategy 'erroring' failed: x"));
    assert_eq!(erroring.reason.chars().count(), "strategy_error: ".len() + 80);
    assert_eq!(erroring.strategy_combo, "erroring");
    assert_eq!((erroring.stop_loss, erroring.take_profit), (99.5, 100.5));

    let panicking = &advisory.strategies[1];
    assert_eq!(panicking.reason, "strategy_error: division by zero in user code");
    assert_eq!(panicking.confidence, Confidence::Low);

    assert_eq!(advisory.strategies[2].strategy_id.as_deref(), Some("mean_reversion"));
}

#[tokio::test]
async fn external_strategies_shadow_builtins() {
    let dir = tempfile::tempdir().unwrap();
    let builder = RegistryBuilder::new(dir.path(), ParameterTuner::disabled()).with_external(
        ExternalStrategy::new(
            "Breakout",
            Evaluator::payload_only(|_| {
                Ok(RawStrategyResult {
                    signal: Some(Signal::Sell),
                    confidence: Some(Confidence::High),
                    ..Default::default()
                })
            }),
        )
        .unwrap(),
    );
    let advisor = advisor_with(builder, vec!["breakout".into()], false);

    let out = advisor.consensus(&json!({ "price_data": { "price": 10 } })).await;
    assert_eq!(out.advisory.enabled_strategies, vec!["breakout"]);
    assert_eq!(out.result.signal, Signal::Sell);
    assert_eq!(out.result.confidence, Confidence::High);
    assert_eq!(out.advisory.strategies[0].strategy_combo, "breakout");
}

#[tokio::test]
async fn listing_and_reload_pick_up_plugins() {
    let dir = tempfile::tempdir().unwrap();
    let advisor = advisor_with(
        RegistryBuilder::new(dir.path(), ParameterTuner::disabled()),
        vec!["momentum".into(), "breakout".into()],
        false,
    );

    let listing = advisor.listing().await;
    assert_eq!(listing.available.len(), 4);
    assert_eq!(listing.enabled, vec!["breakout"]);
    assert_eq!(listing.plugin_dir, dir.path().display().to_string());

    fs::write(
        dir.path().join("momentum.toml"),
        "[buy]\nedge = 18\nwhen = [ { field = \"price_change\", op = \">\", value = 1 } ]\n",
    )
    .unwrap();
    assert!(advisor.reload().await.contains(&"momentum".to_string()));

    let listing = advisor.listing().await;
    assert_eq!(listing.enabled, vec!["momentum", "breakout"]);

    let mut body = payload(100.0, json!({}), &[]);
    body["price_data"]["price_change"] = json!(2.0);
    let out = advisor.consensus(&body).await;
    assert_eq!(out.advisory.strategies[0].signal, Signal::Buy);
    assert_eq!(out.advisory.strategies[0].confidence, Confidence::High);
}

#[tokio::test]
async fn auto_reload_sees_new_plugins_without_explicit_reload() {
    let dir = tempfile::tempdir().unwrap();
    let advisor = advisor_with(
        RegistryBuilder::new(dir.path(), ParameterTuner::disabled()),
        Vec::new(),
        true,
    );
    assert!(!advisor.listing().await.available.contains(&"fresh".to_string()));

    fs::write(
        dir.path().join("fresh.toml"),
        "[sell]\nedge = 5\nwhen = [ { field = \"rsi\", op = \">\", value = 0 } ]\n",
    )
    .unwrap();
    assert!(advisor.listing().await.available.contains(&"fresh".to_string()));
}
