use serde_json::{Map, Value};

/// Pull the tuning object out of an oracle reply.
///
/// Accepts a bare JSON object, JSON embedded in surrounding prose, or a
/// chat-completion envelope whose first message content holds either of
/// those. Anything else is `None`.
pub fn extract_tuning_object(body: &str) -> Option<Map<String, Value>> {
    let mut obj = parse_embedded_json(body)?;
    if obj.get("choices").is_some() {
        let content = obj
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)?;
        obj = parse_embedded_json(content)?;
    }
    match obj {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Parse `text` as JSON, falling back to the span between the first `{`
/// and the last `}`.
fn parse_embedded_json(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    if let Ok(v) = serde_json::from_str::<Value>(text) {
        return Some(v);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}
