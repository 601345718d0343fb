//! Configuration schema definitions.
//!
//! Settings derive Serde traits so they can be embedded in a host
//! application's own configuration. Transforms are code and are attached
//! with the builder methods.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::transform::{RequestContext, ResponseContext, Transforms};
use crate::sink::SinkOptions;

/// Configuration for one `attach`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggerConfig {
    /// Sink connection descriptor (e.g. "memory://default", "file:///var/log/calls").
    pub sink_target: String,

    /// Passed to the sink connector untouched.
    pub sink_options: SinkOptions,

    /// Collection receiving one document per call.
    pub collection_name: String,

    /// Also bind every instance derived from the attached client.
    pub propagate_to_derived: bool,

    /// Key the start stamp is stored under on each call.
    pub namespace: String,

    #[serde(skip)]
    pub transforms: Transforms,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            sink_target: "memory://default".to_string(),
            sink_options: SinkOptions::new(),
            collection_name: "logs".to_string(),
            propagate_to_derived: false,
            namespace: "call-logger".to_string(),
            transforms: Transforms::default(),
        }
    }
}

impl LoggerConfig {
    pub fn new(sink_target: impl Into<String>, collection_name: impl Into<String>) -> Self {
        Self {
            sink_target: sink_target.into(),
            collection_name: collection_name.into(),
            ..Self::default()
        }
    }

    pub fn sink_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.sink_options.insert(key.into(), value.into());
        self
    }

    pub fn propagate_to_derived(mut self, propagate: bool) -> Self {
        self.propagate_to_derived = propagate;
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_request_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value, &RequestContext<'_>) -> Value + Send + Sync + 'static,
    {
        self.transforms = self.transforms.with_request(transform);
        self
    }

    pub fn with_response_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value, &ResponseContext<'_>) -> Value + Send + Sync + 'static,
    {
        self.transforms = self.transforms.with_response(transform);
        self
    }

    /// Scheme of the sink target, safe to log (targets may embed credentials).
    pub fn sink_scheme(&self) -> &str {
        self.sink_target
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .unwrap_or("unknown")
    }
}
