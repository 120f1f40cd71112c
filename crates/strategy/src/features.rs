use serde::Serialize;
use serde_json::Value;

use common::json::{pick, pick_number};

use crate::indicators::{AtrIndicator, RangeIndicator};

/// Volatility unit used when the payload carries no usable candles.
const ATR_FALLBACK_FRACTION: f64 = 0.006;

const BULLISH_KEYWORDS: [&str; 2] = ["bull", "上涨"];
const BEARISH_KEYWORDS: [&str; 2] = ["bear", "下跌"];

/// One OHLC row from the payload's candle history. All four prices are
/// strictly positive; rows that are not are dropped during extraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandleRow {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl CandleRow {
    /// Decode one row, or `None` if any price is absent or non-positive.
    pub fn from_json(row: &Value) -> Option<Self> {
        let field = |keys: &[&str]| pick_number(row, keys).filter(|v| *v > 0.0);
        Some(Self {
            open: field(&["Open", "open"])?,
            high: field(&["High", "high"])?,
            low: field(&["Low", "low"])?,
            close: field(&["Close", "close"])?,
        })
    }
}

/// Fixed feature set every strategy scores against. Extracted once per
/// request; never fails, every field falls back to a safe default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    pub price: f64,
    pub price_change: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub sma20: f64,
    pub sma50: f64,
    pub bb_position: f64,
    pub volume_ratio: f64,
    /// Lower-cased trend label.
    pub trend_overall: String,
    pub atr: f64,
    pub atr_ratio: f64,
    pub atr_use: f64,
    pub range_pct: f64,
}

impl FeatureRecord {
    /// Numeric feature names addressable from rule-file plugins.
    pub const NUMERIC_FIELDS: [&'static str; 13] = [
        "price",
        "price_change",
        "rsi",
        "macd",
        "macd_signal",
        "sma20",
        "sma50",
        "bb_position",
        "volume_ratio",
        "atr",
        "atr_ratio",
        "atr_use",
        "range_pct",
    ];

    /// Decode `payload.price_data` into a feature record.
    pub fn extract(payload: &Value) -> Self {
        let pd = payload.get("price_data").unwrap_or(&Value::Null);
        let technical = pick(pd, &["Technical", "technical"]).unwrap_or(&Value::Null);
        let trend = pick(pd, &["Trend", "trend"]).unwrap_or(&Value::Null);

        let price = pick_number(pd, &["Price", "price"]).unwrap_or(0.0);
        let sma20 = pick_number(technical, &["SMA20", "sma20"]).unwrap_or(price);
        let sma50 = pick_number(technical, &["SMA50", "sma50"]).unwrap_or(sma20);

        let rows = candle_rows(pd);
        let atr = AtrIndicator::default().compute(&rows);
        let range_pct = RangeIndicator::default().compute(&rows);

        Self {
            price,
            price_change: pick_number(pd, &["PriceChange", "price_change"]).unwrap_or(0.0),
            rsi: pick_number(technical, &["RSI", "rsi"]).unwrap_or(50.0),
            macd: pick_number(technical, &["MACD", "macd"]).unwrap_or(0.0),
            macd_signal: pick_number(technical, &["MACDSignal", "macd_signal"]).unwrap_or(0.0),
            sma20,
            sma50,
            bb_position: pick_number(technical, &["BBPosition", "bb_position"]).unwrap_or(0.5),
            volume_ratio: pick_number(technical, &["VolumeRatio", "volume_ratio"]).unwrap_or(1.0),
            trend_overall: trend_label(pick(trend, &["Overall", "overall"])),
            atr,
            atr_ratio: if price > 0.0 { atr / price } else { 0.0 },
            atr_use: if atr > 0.0 { atr } else { price * ATR_FALLBACK_FRACTION },
            range_pct,
        }
    }

    /// Look up a numeric feature by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        let v = match name {
            "price" => self.price,
            "price_change" => self.price_change,
            "rsi" => self.rsi,
            "macd" => self.macd,
            "macd_signal" => self.macd_signal,
            "sma20" => self.sma20,
            "sma50" => self.sma50,
            "bb_position" => self.bb_position,
            "volume_ratio" => self.volume_ratio,
            "atr" => self.atr,
            "atr_ratio" => self.atr_ratio,
            "atr_use" => self.atr_use,
            "range_pct" => self.range_pct,
            _ => return None,
        };
        Some(v)
    }

    pub fn has_valid_price(&self) -> bool {
        self.price > 0.0
    }

    pub fn is_bullish_trend(&self) -> bool {
        BULLISH_KEYWORDS.iter().any(|k| self.trend_overall.contains(k))
    }

    pub fn is_bearish_trend(&self) -> bool {
        BEARISH_KEYWORDS.iter().any(|k| self.trend_overall.contains(k))
    }
}

impl Default for FeatureRecord {
    /// Same record an empty payload extracts to.
    fn default() -> Self {
        Self::extract(&Value::Null)
    }
}

/// Candle history rows that survive validation, oldest first.
pub fn candle_rows(price_data: &Value) -> Vec<CandleRow> {
    pick(price_data, &["KlineData", "kline_data"])
        .and_then(Value::as_array)
        .map(|rows| rows.iter().filter_map(CandleRow::from_json).collect())
        .unwrap_or_default()
}

fn trend_label(raw: Option<&Value>) -> String {
    match raw {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.to_lowercase(),
        Some(other) => other.to_string().to_lowercase(),
    }
}
