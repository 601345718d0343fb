//! Per-call and per-instance configuration.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};

/// Correlation marker carried by a call under one namespace.
#[derive(Debug, Clone, Default)]
pub struct CallMarker {
    /// When the owning interceptor last saw the call leave.
    pub started_at: Option<Instant>,
    /// Unrelated data other components keep under the same namespace.
    pub attributes: Map<String, Value>,
}

/// Configuration for a single outgoing call.
///
/// Each call owns its config, so markers written by one call are never
/// visible to another.
#[derive(Debug, Clone)]
pub struct CallConfig {
    pub method: Method,
    /// Absolute URL, or a path resolved against `base_url`.
    pub url: String,
    pub base_url: Option<String>,
    /// Header pairs as supplied, in order, keys in any case.
    pub headers: Vec<(String, String)>,
    /// Explicit query parameters, merged over any query string in `url`.
    pub params: Map<String, Value>,
    /// Raw request body.
    pub data: Option<String>,
    pub timeout: Option<Duration>,
    pub markers: BTreeMap<String, CallMarker>,
}

impl CallConfig {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            base_url: None,
            headers: Vec::new(),
            params: Map::new(),
            data: None,
            timeout: None,
            markers: BTreeMap::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Serialize `body` as JSON and mark the call as `application/json`.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self, serde_json::Error> {
        let data = serde_json::to_string(body)?;
        Ok(self
            .header("Content-Type", "application/json")
            .body(data))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Marker stored under `namespace`, if any interceptor left one.
    pub fn marker(&self, namespace: &str) -> Option<&CallMarker> {
        self.markers.get(namespace)
    }

    /// Marker under `namespace`, created empty on first access.
    pub fn marker_mut(&mut self, namespace: &str) -> &mut CallMarker {
        self.markers.entry(namespace.to_string()).or_default()
    }

    /// Fill in values the call left unset from instance defaults.
    ///
    /// Call-level headers come after default ones, so they win once
    /// header names are normalized.
    pub(crate) fn merge_defaults(&mut self, defaults: &ClientDefaults) {
        if self.base_url.is_none() {
            self.base_url = defaults.base_url.clone();
        }
        if self.timeout.is_none() {
            self.timeout = defaults.timeout;
        }
        let mut headers = defaults.headers.clone();
        headers.append(&mut self.headers);
        self.headers = headers;
    }

    /// Method as the call configuration spells it, upper-cased.
    pub fn method_name(&self) -> String {
        self.method.as_str().to_uppercase()
    }

    /// The URL the call targets, joined with `base_url` when relative.
    pub fn full_url(&self) -> String {
        match &self.base_url {
            Some(base) if !is_absolute(&self.url) => {
                format!("{}/{}", base.trim_end_matches('/'), self.url.trim_start_matches('/'))
            }
            _ => self.url.clone(),
        }
    }
}

/// Absolute when a scheme precedes `://` ahead of any path, query or fragment.
fn is_absolute(url: &str) -> bool {
    match url.find("://") {
        Some(idx) => idx > 0 && !url[..idx].contains(['/', '?', '#']),
        None => false,
    }
}

/// Defaults shared by every call on one client instance.
#[derive(Debug, Clone)]
pub struct ClientDefaults {
    pub base_url: Option<String>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl Default for ClientDefaults {
    fn default() -> Self {
        Self {
            base_url: None,
            headers: vec![
                ("Accept".to_string(), "application/json, text/plain, */*".to_string()),
                (
                    "User-Agent".to_string(),
                    concat!("call-logger/", env!("CARGO_PKG_VERSION")).to_string(),
                ),
            ],
            timeout: None,
        }
    }
}

impl ClientDefaults {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Layer `overrides` on top of these defaults for a derived instance.
    pub(crate) fn merged(&self, overrides: ClientDefaults) -> ClientDefaults {
        let mut headers = self.headers.clone();
        headers.extend(
            overrides
                .headers
                .into_iter()
                .filter(|pair| !self.headers.contains(pair)),
        );
        ClientDefaults {
            base_url: overrides.base_url.or_else(|| self.base_url.clone()),
            headers,
            timeout: overrides.timeout.or(self.timeout),
        }
    }
}
