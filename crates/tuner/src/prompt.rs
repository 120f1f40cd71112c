use serde_json::{json, Value};

pub const SYSTEM_PROMPT: &str =
    "You are a risk-aware quant parameter tuner. Return strict JSON only.";

/// How many of the caller's prior signals are forwarded to the oracle.
pub const RECENT_SIGNAL_LIMIT: usize = 8;

/// The user-message body: market snapshot, bounds, and the expected schema.
/// The oracle may only tune parameters, never choose a direction.
pub fn tuning_prompt(payload: &Value) -> Value {
    let market = payload.get("price_data").cloned().unwrap_or_else(|| json!({}));
    let recent: Vec<Value> = payload
        .get("last_signals")
        .and_then(Value::as_array)
        .map(|signals| {
            let skip = signals.len().saturating_sub(RECENT_SIGNAL_LIMIT);
            signals[skip..].to_vec()
        })
        .unwrap_or_default();

    json!({
        "task": "Tune strategy parameters for current market regime with risk-aware bias.",
        "constraints": {
            "bias_shift": "[-8,8] points",
            "entry_threshold": "[8,16]",
            "sl_mult": "[1.2,2.2]",
            "tp_mult": "[1.6,3.4]",
            "filter_mode": "strict|normal|loose",
            "confidence_delta": "-1|0|1",
        },
        "rules": [
            "Do not output trading direction, only parameter tuning.",
            "If uncertainty is high, prefer stricter filters and higher entry threshold.",
            "Keep risk-reward coherent: tp_mult should usually be >= sl_mult.",
            "Output JSON object only.",
        ],
        "market": market,
        "recent_signals": recent,
        "output_json_only": true,
        "schema": {
            "bias_shift": 0,
            "entry_threshold": 10,
            "sl_mult": 1.6,
            "tp_mult": 2.2,
            "filter_mode": "normal",
            "confidence_delta": 0,
            "reason": "short reason",
        },
    })
}

/// Full chat-completion request body.
pub fn chat_request(model: &str, payload: &Value) -> Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": tuning_prompt(payload).to_string() },
        ],
        "temperature": 0.1,
        "stream": false,
    })
}
