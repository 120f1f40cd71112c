//! Rule-file strategies discovered from the plugin directory.
//!
//! Each `*.toml` file declares buy/sell condition lists over the feature
//! record (or the raw payload through JSON pointers). Files whose name starts
//! with `_` are ignored, which is how the shipped template stays inert.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use common::json::number;
use common::{Confidence, Error, RawStrategyResult, Result, Signal};
use risk::{ExitLevels, ExitMultipliers};

use crate::features::FeatureRecord;
use crate::{normalize_id, Strategy};

pub const PLUGIN_EXTENSION: &str = "toml";
pub const PLUGIN_TEMPLATE_FILENAME: &str = "_sample_template.toml";
pub const PLUGIN_TEMPLATE: &str = include_str!("../templates/_sample_template.toml");

// ─── File schema ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RuleFile {
    id: Option<String>,
    combo: Option<String>,
    reason: Option<String>,
    sl_mult: Option<f64>,
    tp_mult: Option<f64>,
    buy: Option<RuleSide>,
    sell: Option<RuleSide>,
}

/// Conditions that must all hold for one side to fire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuleSide {
    pub edge: f64,
    #[serde(default)]
    pub when: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Condition {
    pub field: Operand,
    pub op: CompareOp,
    pub value: Operand,
}

/// A literal number, a feature name, or a `/json/pointer` into the payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    Literal(f64),
    Name(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl CompareOp {
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
        }
    }
}

impl Operand {
    fn resolve(&self, payload: &Value, features: &FeatureRecord) -> Option<f64> {
        match self {
            Operand::Literal(v) => Some(*v),
            Operand::Name(p) if p.starts_with('/') => payload.pointer(p).and_then(number),
            Operand::Name(name) => features.get(name),
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Operand::Literal(v) if !v.is_finite() => Err(format!("non-finite literal {v}")),
            Operand::Literal(_) => Ok(()),
            Operand::Name(p) if p.starts_with('/') => validate_pointer(p),
            Operand::Name(name) if FeatureRecord::NUMERIC_FIELDS.contains(&name.as_str()) => Ok(()),
            Operand::Name(name) => Err(format!("unknown feature '{name}'")),
        }
    }
}

/// `~` may only appear as the `~0` / `~1` escapes.
fn validate_pointer(pointer: &str) -> std::result::Result<(), String> {
    let mut chars = pointer.chars();
    while let Some(c) = chars.next() {
        if c == '~' && !matches!(chars.next(), Some('0') | Some('1')) {
            return Err(format!("malformed JSON pointer '{pointer}'"));
        }
    }
    Ok(())
}

impl Condition {
    fn holds(&self, payload: &Value, features: &FeatureRecord) -> bool {
        match (
            self.field.resolve(payload, features),
            self.value.resolve(payload, features),
        ) {
            (Some(lhs), Some(rhs)) => self.op.holds(lhs, rhs),
            _ => false,
        }
    }
}

impl RuleSide {
    /// An empty side never fires.
    fn fires(&self, payload: &Value, features: &FeatureRecord) -> bool {
        !self.when.is_empty() && self.when.iter().all(|c| c.holds(payload, features))
    }
}

// ─── Compiled strategy ────────────────────────────────────────────────────────

/// A validated rule-file strategy.
#[derive(Debug, Clone)]
pub struct RuleStrategy {
    id: String,
    combo: String,
    reason: String,
    mult: ExitMultipliers,
    buy: Option<RuleSide>,
    sell: Option<RuleSide>,
}

impl RuleStrategy {
    /// Parse and validate a definition. `fallback_id` (normally the file
    /// stem) is used when the definition carries no `id`.
    pub fn parse(source: &str, fallback_id: &str) -> Result<Self> {
        let file: RuleFile = toml::from_str(source)?;

        let id = normalize_id(file.id.as_deref().unwrap_or(fallback_id));
        if id.is_empty() {
            return Err(Error::invalid_plugin(fallback_id, "empty strategy id"));
        }

        let sides = [file.buy.as_ref(), file.sell.as_ref()];
        if !sides.iter().flatten().any(|s| !s.when.is_empty()) {
            return Err(Error::invalid_plugin(&id, "no buy or sell conditions"));
        }
        for side in sides.into_iter().flatten() {
            if !side.edge.is_finite() {
                return Err(Error::invalid_plugin(&id, "edge must be finite"));
            }
            for cond in &side.when {
                cond.field
                    .validate()
                    .and_then(|_| cond.value.validate())
                    .map_err(|reason| Error::invalid_plugin(&id, reason))?;
            }
        }

        let defaults = ExitMultipliers::default();
        let mult = ExitMultipliers::new(
            file.sl_mult.unwrap_or(defaults.stop),
            file.tp_mult.unwrap_or(defaults.target),
        );
        if !(mult.stop.is_finite() && mult.stop > 0.0 && mult.target.is_finite() && mult.target > 0.0) {
            return Err(Error::invalid_plugin(&id, "sl_mult and tp_mult must be positive numbers"));
        }

        Ok(Self {
            combo: file.combo.unwrap_or_else(|| id.clone()),
            reason: file.reason.unwrap_or_else(|| id.clone()),
            mult,
            buy: file.buy,
            sell: file.sell,
            id,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        Self::parse(&source, stem)
    }

    pub fn decide(&self, payload: &Value, features: &FeatureRecord) -> RawStrategyResult {
        if !features.has_valid_price() {
            return RawStrategyResult::invalid_price(&self.combo);
        }

        let fired = |side: &Option<RuleSide>| {
            side.as_ref()
                .filter(|s| s.fires(payload, features))
                .map(|s| (s.edge, s.when.len()))
        };
        let (signal, edge, detail) = if let Some((edge, n)) = fired(&self.buy) {
            (Signal::Buy, edge, format!("buy rules matched ({n})"))
        } else if let Some((edge, n)) = fired(&self.sell) {
            (Signal::Sell, edge, format!("sell rules matched ({n})"))
        } else {
            (Signal::Hold, 0.0, "no rule matched".to_string())
        };

        let levels = ExitLevels::around(features.price, features.atr_use, signal, self.mult);
        RawStrategyResult::decided(
            signal,
            Confidence::from_edge(edge),
            format!("{}: {detail}", self.reason),
            levels.stop_loss,
            levels.take_profit,
            self.combo.clone(),
        )
    }
}

#[async_trait]
impl Strategy for RuleStrategy {
    fn id(&self) -> &str {
        &self.id
    }

    async fn evaluate(&self, payload: &Value, features: &FeatureRecord) -> Result<RawStrategyResult> {
        Ok(self.decide(payload, features))
    }
}

// ─── Discovery ────────────────────────────────────────────────────────────────

/// Whether a bare file name is picked up by discovery.
pub fn is_plugin_file_name(name: &str) -> bool {
    !name.starts_with('_')
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext == PLUGIN_EXTENSION)
        && name.len() > PLUGIN_EXTENSION.len() + 1
}

/// Check a client-supplied plugin file name before writing it to disk.
pub fn validate_upload_name(name: &str) -> Result<()> {
    let reject = |reason: &str| Err(Error::invalid_plugin(name, reason));
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return reject("file name must not contain path separators or '..'");
    }
    if name.starts_with('_') {
        return reject("file names starting with '_' are ignored by discovery");
    }
    if !is_plugin_file_name(name) {
        return reject("file name must end in .toml");
    }
    Ok(())
}

/// Load every plugin in `dir`, in sorted file-name order. Broken files are
/// logged and skipped; a missing directory yields no plugins.
pub fn discover(dir: &Path) -> Vec<RuleStrategy> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(path = %dir.display(), error = %e, "Plugin directory not readable");
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_plugin_file_name)
        })
        .collect();
    paths.sort();

    paths
        .iter()
        .filter_map(|path| match RuleStrategy::load(path) {
            Ok(strategy) => {
                info!(strategy_id = %strategy.id, path = %path.display(), "Loaded strategy plugin");
                Some(strategy)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping strategy plugin");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn features(price: f64, rsi: f64) -> FeatureRecord {
        FeatureRecord::extract(&json!({
            "price_data": { "price": price, "technical": { "rsi": rsi, "sma50": 90.0 } }
        }))
    }

    #[test]
    fn template_parses_but_is_not_discoverable() {
        let strategy = RuleStrategy::parse(PLUGIN_TEMPLATE, "template").unwrap();
        assert_eq!(strategy.id(), "rsi_extreme");
        assert!(!is_plugin_file_name(PLUGIN_TEMPLATE_FILENAME));
    }

    #[test]
    fn buy_side_fires_when_all_conditions_hold() {
        let strategy = RuleStrategy::parse(PLUGIN_TEMPLATE, "x").unwrap();
        let r = strategy.decide(&json!({}), &features(100.0, 20.0));
        assert_eq!(r.signal, Some(Signal::Buy));
        assert_eq!(r.confidence, Some(Confidence::Medium));
        assert_eq!(r.strategy_combo.as_deref(), Some("rsi_extreme"));
        // 1.5 / 2.4 against the 0.6 fallback volatility unit.
        assert!((r.stop_loss.unwrap() - 99.1).abs() < 1e-9);
        assert!((r.take_profit.unwrap() - 101.44).abs() < 1e-9);

        let r = strategy.decide(&json!({}), &features(100.0, 50.0));
        assert_eq!(r.signal, Some(Signal::Hold));
        assert_eq!(r.reason.as_deref(), Some("rsi extremes with trend filter: no rule matched"));
    }

    #[test]
    fn defaults_come_from_the_file_stem() {
        let src = r#"
            [sell]
            edge = 20
            when = [ { field = "rsi", op = ">", value = 70 } ]
        "#;
        let strategy = RuleStrategy::parse(src, "My Plugin").unwrap();
        assert_eq!(strategy.id(), "my_plugin");
        let r = strategy.decide(&json!({}), &features(100.0, 80.0));
        assert_eq!(r.signal, Some(Signal::Sell));
        assert_eq!(r.confidence, Some(Confidence::High));
        assert_eq!(r.strategy_combo.as_deref(), Some("my_plugin"));
        // Default 1.6 / 2.2 multipliers.
        assert!((r.stop_loss.unwrap() - 100.96).abs() < 1e-9);
        assert!((r.take_profit.unwrap() - 98.68).abs() < 1e-9);
    }

    #[test]
    fn pointer_operands_read_the_raw_payload() {
        let src = r#"
            [buy]
            edge = 12
            when = [ { field = "/price_data/Technical/ADX", op = ">=", value = 25 } ]
        "#;
        let strategy = RuleStrategy::parse(src, "adx").unwrap();
        let strong = json!({ "price_data": { "Technical": { "ADX": "31" } } });
        let weak = json!({ "price_data": { "Technical": { "ADX": 12 } } });
        let f = features(10.0, 50.0);
        assert_eq!(strategy.decide(&strong, &f).signal, Some(Signal::Buy));
        assert_eq!(strategy.decide(&weak, &f).signal, Some(Signal::Hold));
        // Unresolvable operands make the condition false.
        assert_eq!(strategy.decide(&json!({}), &f).signal, Some(Signal::Hold));
    }

    #[test]
    fn invalid_price_short_circuits_with_combo() {
        let strategy = RuleStrategy::parse(PLUGIN_TEMPLATE, "x").unwrap();
        let r = strategy.decide(&json!({}), &features(0.0, 20.0));
        assert_eq!(r, RawStrategyResult::invalid_price("rsi_extreme"));
    }

    #[test]
    fn rejects_bad_definitions() {
        let cases = [
            ("id = ", "syntax"),
            (r#"id = "x""#, "no conditions"),
            (
                "[buy]\nedge = 1\nwhen = []\n",
                "empty side",
            ),
            (
                "id = \"  \"\n[buy]\nedge = 1\nwhen = [ { field = \"rsi\", op = \"<\", value = 1 } ]\n",
                "blank id",
            ),
            (
                "[buy]\nedge = 1\nwhen = [ { field = \"adx\", op = \"<\", value = 1 } ]\n",
                "unknown feature",
            ),
            (
                "[buy]\nedge = 1\nwhen = [ { field = \"/a~2b\", op = \"<\", value = 1 } ]\n",
                "bad pointer",
            ),
            (
                "[buy]\nedge = 1\nwhen = [ { field = \"rsi\", op = \"=~\", value = 1 } ]\n",
                "bad operator",
            ),
            (
                "sl_mult = -2\n[buy]\nedge = 1\nwhen = [ { field = \"rsi\", op = \"<\", value = 1 } ]\n",
                "negative stop multiplier",
            ),
            (
                "tp_mult = nan\n[buy]\nedge = 1\nwhen = [ { field = \"rsi\", op = \"<\", value = 1 } ]\n",
                "nan target multiplier",
            ),
            (
                "sl_mult = inf\n[sell]\nedge = 1\nwhen = [ { field = \"rsi\", op = \">\", value = 1 } ]\n",
                "infinite stop multiplier",
            ),
            (
                "tp_mult = 0\n[sell]\nedge = 1\nwhen = [ { field = \"rsi\", op = \">\", value = 1 } ]\n",
                "zero target multiplier",
            ),
        ];
        for (src, label) in cases {
            assert!(RuleStrategy::parse(src, "case").is_err(), "{label} should be rejected");
        }
    }

    #[test]
    fn upload_names_are_checked() {
        assert!(validate_upload_name("momentum.toml").is_ok());
        assert!(validate_upload_name("../evil.toml").is_err());
        assert!(validate_upload_name("dir/evil.toml").is_err());
        assert!(validate_upload_name("_hidden.toml").is_err());
        assert!(validate_upload_name("script.py").is_err());
        assert!(validate_upload_name(".toml").is_err());
    }

    #[test]
    fn discovery_is_sorted_and_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let rule = |id: &str| {
            format!("id = \"{id}\"\n[buy]\nedge = 10\nwhen = [ {{ field = \"rsi\", op = \"<\", value = 30 }} ]\n")
        };
        fs::write(dir.path().join("b.toml"), rule("beta")).unwrap();
        fs::write(dir.path().join("a.toml"), rule("alpha")).unwrap();
        fs::write(dir.path().join("broken.toml"), "not = [valid").unwrap();
        fs::write(dir.path().join("_skip.toml"), rule("skipped")).unwrap();
        fs::write(dir.path().join("notes.txt"), rule("text")).unwrap();

        let ids: Vec<String> = discover(dir.path()).iter().map(|s| s.id().to_string()).collect();
        assert_eq!(ids, vec!["alpha", "beta"]);
    }

    #[test]
    fn missing_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(&dir.path().join("absent")).is_empty());
    }
}
