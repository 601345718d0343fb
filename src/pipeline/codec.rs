//! Body decoding for records.
//!
//! Request bodies arrive raw and are decoded here. Response bodies were
//! already decoded by the transport and are taken as-is.

use std::collections::BTreeMap;

use serde_json::Value;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Falsy values record as null and never reach a transform:
/// null, `false`, `0`, and the empty string.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn is_json(headers: &BTreeMap<String, String>) -> bool {
    headers
        .get("content-type")
        .map(|v| v.trim_start().to_ascii_lowercase().starts_with(JSON_CONTENT_TYPE))
        .unwrap_or(false)
}

/// Decode a raw request body given normalized (lowercase) headers.
///
/// JSON content that fails to parse records as null. Parsed scalars such
/// as `0` or `false` are kept.
pub fn decode_request_body(headers: &BTreeMap<String, String>, raw: Option<&str>) -> Value {
    if is_json(headers) {
        return raw
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or(Value::Null);
    }
    match raw {
        Some(raw) if !raw.is_empty() => Value::String(raw.to_string()),
        _ => Value::Null,
    }
}

pub fn decode_response_body(data: &Value) -> Value {
    if is_truthy(data) {
        data.clone()
    } else {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::normalize_headers;
    use serde_json::json;

    fn headers(content_type: &str) -> BTreeMap<String, String> {
        normalize_headers(vec![("Content-Type", content_type)])
    }

    #[test]
    fn test_json_body_decoded() {
        let value = decode_request_body(&headers("application/json;charset=utf-8"), Some(r#"{"x":1,"y":2}"#));
        assert_eq!(value, json!({"x": 1, "y": 2}));
    }

    #[test]
    fn test_malformed_json_is_null() {
        assert_eq!(decode_request_body(&headers("application/json"), Some("{x:")), Value::Null);
        assert_eq!(decode_request_body(&headers("application/json"), None), Value::Null);
    }

    #[test]
    fn test_non_json_passthrough() {
        let value = decode_request_body(&headers("text/plain"), Some(r#"{"x":1}"#));
        assert_eq!(value, Value::from(r#"{"x":1}"#));
        assert_eq!(decode_request_body(&BTreeMap::new(), Some("")), Value::Null);
        assert_eq!(decode_request_body(&BTreeMap::new(), None), Value::Null);
    }

    #[test]
    fn test_json_scalar_request_body_kept() {
        let json_headers = headers("application/json");
        assert_eq!(decode_request_body(&json_headers, Some("0")), json!(0));
        assert_eq!(decode_request_body(&json_headers, Some("false")), json!(false));
        assert_eq!(decode_request_body(&json_headers, Some(r#""""#)), json!(""));
    }

    #[test]
    fn test_response_falsy_is_null() {
        assert_eq!(decode_response_body(&json!("")), Value::Null);
        assert_eq!(decode_response_body(&json!(0)), Value::Null);
        assert_eq!(decode_response_body(&json!({"x": "y"})), json!({"x": "y"}));
        assert_eq!(decode_response_body(&json!([])), json!([]));
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(is_truthy(&json!(-1)));
        assert!(is_truthy(&json!({})));
    }
}
