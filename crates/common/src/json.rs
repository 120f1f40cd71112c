//! Helpers for reading loosely-shaped JSON documents.

use serde_json::Value;

/// First value present under any of `keys`, if `obj` is an object.
pub fn pick<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let map = obj.as_object()?;
    keys.iter().find_map(|k| map.get(*k))
}

/// Numeric reading of a JSON value: numbers and numeric strings are
/// accepted, everything else (including NaN/inf) is `None`.
pub fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// `pick` followed by `number`.
pub fn pick_number(obj: &Value, keys: &[&str]) -> Option<f64> {
    pick(obj, keys).and_then(number)
}
