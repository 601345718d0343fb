//! The persisted record and how it is assembled.
//!
//! # Wire shape
//! ```text
//! {
//!   request:  { method, path, headers, query, body },
//!   response: { status, statusText, headers, body } | null,
//!   error:    string | null,
//!   time:     milliseconds | "UNKNOWN",
//!   timestamp: epoch milliseconds
//! }
//! ```
//! Exactly one of `response` and `error` is non-null.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::pipeline::codec::{decode_request_body, decode_response_body};
use crate::pipeline::correlation;
use crate::pipeline::normalize::{normalize_header_map, normalize_headers, normalize_query, parse_lenient};
use crate::pipeline::transform::{RequestContext, ResponseContext, Transforms};
use crate::transport::{CallConfig, CallError, CallResponse, RequestHandle};

/// Placeholder for fields the failed call never produced.
pub const UNKNOWN: &str = "UNKNOWN";

/// Message recorded for failures that carry none.
pub const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestPart {
    pub method: String,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub query: Map<String, Value>,
    pub body: Value,
}

impl RequestPart {
    /// Request part for a failure that happened before any request existed.
    pub fn unknown() -> Self {
        Self {
            method: UNKNOWN.to_string(),
            path: UNKNOWN.to_string(),
            headers: BTreeMap::new(),
            query: Map::new(),
            body: Value::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePart {
    pub status: u16,
    #[serde(rename = "statusText")]
    pub status_text: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

/// Call duration, or `Unknown` when the call was never stamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elapsed {
    Millis(u64),
    Unknown,
}

impl Elapsed {
    pub fn as_millis(&self) -> Option<u64> {
        match self {
            Elapsed::Millis(ms) => Some(*ms),
            Elapsed::Unknown => None,
        }
    }
}

impl Serialize for Elapsed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Elapsed::Millis(ms) => serializer.serialize_u64(*ms),
            Elapsed::Unknown => serializer.serialize_str(UNKNOWN),
        }
    }
}

impl<'de> Deserialize<'de> for Elapsed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ElapsedVisitor;

        impl Visitor<'_> for ElapsedVisitor {
            type Value = Elapsed;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "milliseconds or \"{}\"", UNKNOWN)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Elapsed, E> {
                Ok(Elapsed::Millis(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Elapsed, E> {
                u64::try_from(v)
                    .map(Elapsed::Millis)
                    .map_err(|_| E::custom("negative elapsed time"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Elapsed, E> {
                if v == UNKNOWN {
                    Ok(Elapsed::Unknown)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(ElapsedVisitor)
    }
}

/// One persisted call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub request: RequestPart,
    pub response: Option<ResponsePart>,
    pub error: Option<String>,
    pub time: Elapsed,
    pub timestamp: u64,
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Assembles records for one binding.
pub struct RecordBuilder<'a> {
    transforms: &'a Transforms,
    namespace: &'a str,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(transforms: &'a Transforms, namespace: &'a str) -> Self {
        Self { transforms, namespace }
    }

    pub fn build_request_part(&self, config: &CallConfig, request: Option<&RequestHandle>) -> RequestPart {
        let headers = normalize_headers(config.headers.iter().map(|(k, v)| (k, v)));
        let full_url = config.full_url();
        let query = normalize_query(&full_url, &config.params);

        let method = match request {
            Some(request) => request.method.as_str().to_string(),
            None => config.method_name(),
        };
        let path = match request {
            Some(request) => request.url.path().to_string(),
            None => parse_lenient(&full_url)
                .map(|url| url.path().to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
        };

        let body = decode_request_body(&headers, config.data.as_deref());
        let body = self
            .transforms
            .apply_request(body, &RequestContext { request, config });

        RequestPart {
            method,
            path,
            headers,
            query,
            body,
        }
    }

    pub fn build_response_part(&self, response: &CallResponse) -> ResponsePart {
        let body = decode_response_body(&response.data);
        let body = self.transforms.apply_response(
            body,
            &ResponseContext {
                response,
                config: &response.config,
            },
        );

        ResponsePart {
            status: response.status.as_u16(),
            status_text: response.status_text.clone(),
            headers: normalize_header_map(&response.headers),
            body,
        }
    }

    /// Record for a call that completed.
    pub fn success(&self, response: &CallResponse) -> LogRecord {
        let completed_at = Instant::now();
        LogRecord {
            request: self.build_request_part(&response.config, Some(&response.request)),
            response: Some(self.build_response_part(response)),
            error: None,
            time: correlation::elapsed(Some(&response.config), self.namespace, completed_at),
            timestamp: epoch_millis(),
        }
    }

    /// Record for a call that failed, at whatever stage.
    pub fn failure(&self, error: &CallError) -> LogRecord {
        let completed_at = Instant::now();
        let request = match &error.config {
            Some(config) => self.build_request_part(config, error.request.as_ref()),
            None => RequestPart::unknown(),
        };
        let message = if error.message.is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            error.message.clone()
        };

        LogRecord {
            request,
            response: None,
            error: Some(message),
            time: correlation::elapsed(error.config.as_ref(), self.namespace, completed_at),
            timestamp: epoch_millis(),
        }
    }
}
