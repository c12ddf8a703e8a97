//! Lenient field access over `serde_json::Value`.
//!
//! Optional fields degrade to `None`/defaults instead of failing the whole
//! document; only the adapters decide which fields are required.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// String field; numbers and booleans are rendered, null and absent are `None`.
pub fn str_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Non-empty string field.
pub fn non_empty_str(value: &Value, key: &str) -> Option<String> {
    str_field(value, key).filter(|s| !s.trim().is_empty())
}

/// Integer field, accepting numeric strings. Negative values clamp to zero.
pub fn u32_field(value: &Value, key: &str) -> Option<u32> {
    match value.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .map(|n| n.min(u32::MAX as u64) as u32),
        Value::String(s) => parse_leading_u32(s),
        _ => None,
    }
}

/// Decimal field, accepting numeric strings such as "10.5".
pub fn f64_field(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

pub fn bool_field(value: &Value, key: &str) -> Option<bool> {
    match value.get(key)? {
        Value::Bool(b) => Some(*b),
        _ => None,
    }
}

/// Array of strings; non-string members are skipped, duplicates kept.
pub fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

pub fn array<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    value.get(key).and_then(Value::as_array)
}

pub fn object<'a>(value: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    value.get(key).and_then(Value::as_object)
}

/// Required array, or `SchemaMismatch` naming the field.
pub fn require_array<'a>(value: &'a Value, key: &str) -> Result<&'a Vec<Value>> {
    array(value, key).ok_or_else(|| Error::SchemaMismatch(format!("missing `{}` array", key)))
}

/// Unwrap a `{success, data}` envelope.
///
/// An absent or false `success` flag and an absent `data` field are both
/// rejections: nothing of the payload is used.
pub fn unwrap_envelope(root: Value) -> Result<Value> {
    let Value::Object(mut map) = root else {
        return Err(Error::UpstreamRejected("response is not an object".to_string()));
    };

    match map.get("success") {
        Some(Value::Bool(true)) => {}
        Some(_) => {
            let reason = map
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("success flag is false");
            return Err(Error::UpstreamRejected(reason.to_string()));
        }
        None => {
            return Err(Error::UpstreamRejected("missing success flag".to_string()));
        }
    }

    map.remove("data")
        .ok_or_else(|| Error::UpstreamRejected("missing `data` field".to_string()))
}

/// Consumet-style error bodies replace the payload with a `message`.
pub fn rejection_message(root: &Value, payload_key: &str) -> Option<String> {
    if root.get(payload_key).is_some() {
        return None;
    }
    non_empty_str(root, "message").or_else(|| non_empty_str(root, "error"))
}

fn parse_leading_u32(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<u32>() {
        return Some(n);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && *f >= 0.0)
        .map(|f| f.min(u32::MAX as f64) as u32)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_str_field_variants() {
        let v = json!({"a": "x", "b": 3, "c": null, "d": [1]});
        assert_eq!(str_field(&v, "a").as_deref(), Some("x"));
        assert_eq!(str_field(&v, "b").as_deref(), Some("3"));
        assert_eq!(str_field(&v, "c"), None);
        assert_eq!(str_field(&v, "d"), None);
        assert_eq!(str_field(&v, "missing"), None);
    }

    #[test]
    fn test_u32_field() {
        let v = json!({"n": 12, "s": "7", "f": "12.5", "e": "", "neg": -4, "bad": "abc"});
        assert_eq!(u32_field(&v, "n"), Some(12));
        assert_eq!(u32_field(&v, "s"), Some(7));
        assert_eq!(u32_field(&v, "f"), Some(12));
        assert_eq!(u32_field(&v, "e"), None);
        assert_eq!(u32_field(&v, "neg"), Some(0));
        assert_eq!(u32_field(&v, "bad"), None);
    }

    #[test]
    fn test_f64_field() {
        let v = json!({"a": "10.5", "b": 3, "c": "x"});
        assert_eq!(f64_field(&v, "a"), Some(10.5));
        assert_eq!(f64_field(&v, "b"), Some(3.0));
        assert_eq!(f64_field(&v, "c"), None);
    }

    #[test]
    fn test_string_list_keeps_duplicates_and_order() {
        let v = json!({"genres": ["Action", "Drama", "Action", 5]});
        assert_eq!(string_list(&v, "genres"), vec!["Action", "Drama", "Action"]);
    }

    #[test]
    fn test_unwrap_envelope() {
        let data = unwrap_envelope(json!({"success": true, "data": {"x": 1}})).unwrap();
        assert_eq!(data, json!({"x": 1}));
    }

    #[test]
    fn test_unwrap_envelope_rejections() {
        for body in [
            json!({"success": false, "data": {"x": 1}}),
            json!({"data": {"x": 1}}),
            json!({"success": true}),
            json!({"success": "yes", "data": {}}),
            json!([1, 2]),
        ] {
            assert!(matches!(
                unwrap_envelope(body),
                Err(Error::UpstreamRejected(_))
            ));
        }
    }

    #[test]
    fn test_rejection_message() {
        assert_eq!(
            rejection_message(&json!({"message": "Anime not found"}), "results").as_deref(),
            Some("Anime not found")
        );
        assert_eq!(
            rejection_message(&json!({"results": [], "message": "ok"}), "results"),
            None
        );
        assert_eq!(rejection_message(&json!({"id": "x"}), "results"), None);
    }
}
