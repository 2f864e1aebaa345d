//! Lenient conversion of untrusted JSON values.
//!
//! Upstream producers disagree on types: amounts arrive as numbers or as
//! strings (sometimes `"$0.01"`), wallets as strings or occasionally numbers.
//! Every function here returns `None` instead of failing.

use serde_json::{Map, Value};

/// Returns `true` if `value` counts as set.
///
/// `null`, `false`, zero, and empty strings, arrays and objects are unset.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Returns the first truthy field of `record` among `keys`, in order.
#[must_use]
pub fn first_truthy<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find(|value| is_truthy(value))
}

/// Converts an amount to a positive finite `f64`.
///
/// Accepts JSON numbers and numeric strings with an optional leading `$`.
#[must_use]
pub fn amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            let s = s.strip_prefix('$').unwrap_or(s);
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    (amount.is_finite() && amount > 0.0).then_some(amount)
}

/// Converts a wallet reference to a non-empty string.
///
/// Accepts strings (trimmed) and numbers.
#[must_use]
pub fn wallet(value: &Value) -> Option<String> {
    let wallet = match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!wallet.is_empty()).then_some(wallet)
}

/// Converts a transaction reference to a non-empty string.
#[must_use]
pub fn tx_hash(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        _ => None,
    }
}
