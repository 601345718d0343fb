//! Completed calls and the transport-level request snapshot.

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::transport::config::CallConfig;

/// The request exactly as it went on the wire.
#[derive(Debug, Clone)]
pub struct RequestHandle {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

impl RequestHandle {
    pub(crate) fn from_request(request: &reqwest::Request) -> Self {
        Self {
            method: request.method().clone(),
            url: request.url().clone(),
            headers: request.headers().clone(),
        }
    }
}

/// A call that completed with a 2xx status.
#[derive(Debug, Clone)]
pub struct CallResponse {
    pub status: StatusCode,
    pub status_text: Option<String>,
    pub headers: HeaderMap,
    /// Body decoded by the transport: JSON when the server said so and
    /// it parsed, otherwise raw text, `Null` when empty.
    pub data: Value,
    pub config: CallConfig,
    pub request: RequestHandle,
}

/// Decode a response body the way the transport hands it to callers.
pub(crate) fn decode_body(headers: &HeaderMap, text: String) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    let is_json = headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("json"))
        .unwrap_or(false);
    if is_json {
        if let Ok(value) = serde_json::from_str(&text) {
            return value;
        }
    }
    Value::String(text)
}
