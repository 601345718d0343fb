//! HTTP client with per-instance interceptor chains.
//!
//! # Responsibilities
//! - Merge instance defaults into each call
//! - Run request interceptors, dispatch, run response interceptors
//! - Derive new instances that share the connection pool
//!
//! # Design Decisions
//! - Built on reqwest; one pool shared by an instance and everything derived from it
//! - Derived instances get fresh interceptor chains; only the derive hook can bind them

use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::transport::config::{CallConfig, ClientDefaults};
use crate::transport::error::{CallError, CallErrorKind};
use crate::transport::interceptor::{Interceptable, RequestInterceptor, ResponseInterceptor};
use crate::transport::response::{decode_body, CallResponse, RequestHandle};

/// Post-processes every instance produced by [`HttpClient::create`].
pub type DeriveHook = Arc<dyn Fn(HttpClient) -> HttpClient + Send + Sync>;

#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    defaults: ClientDefaults,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
    derive_hook: Option<DeriveHook>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("defaults", &self.defaults)
            .field("request_interceptors", &self.request_interceptors.len())
            .field("response_interceptors", &self.response_interceptors.len())
            .field("derive_hook", &self.derive_hook.is_some())
            .finish()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    pub fn new() -> Self {
        Self::with_defaults(ClientDefaults::default())
    }

    pub fn with_defaults(defaults: ClientDefaults) -> Self {
        Self::from_parts(reqwest::Client::new(), defaults)
    }

    /// Wrap an already configured reqwest client (proxy, TLS, pool settings).
    pub fn from_reqwest(inner: reqwest::Client, defaults: ClientDefaults) -> Self {
        Self::from_parts(inner, defaults)
    }

    fn from_parts(inner: reqwest::Client, defaults: ClientDefaults) -> Self {
        Self {
            inner,
            defaults,
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
            derive_hook: None,
        }
    }

    pub fn defaults(&self) -> &ClientDefaults {
        &self.defaults
    }

    pub fn request_interceptor_count(&self) -> usize {
        self.request_interceptors.len()
    }

    pub fn response_interceptor_count(&self) -> usize {
        self.response_interceptors.len()
    }

    /// Derive a new instance inheriting this one's defaults.
    ///
    /// The new instance starts with empty interceptor chains and no derive
    /// hook of its own; this instance's hook, if any, sees it first.
    pub fn create(&self, defaults: ClientDefaults) -> HttpClient {
        let child = Self::from_parts(self.inner.clone(), self.defaults.merged(defaults));
        match &self.derive_hook {
            Some(hook) => hook(child),
            None => child,
        }
    }

    pub async fn get(&self, url: impl Into<String>) -> Result<CallResponse, CallError> {
        self.request(CallConfig::get(url)).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: impl Into<String>,
        body: &T,
    ) -> Result<CallResponse, CallError> {
        let config = CallConfig::post(url)
            .json(body)
            .map_err(|e| CallError::new(CallErrorKind::Build, e.to_string()))?;
        self.request(config).await
    }

    /// Execute one call through the full interceptor chain.
    pub async fn request(&self, mut config: CallConfig) -> Result<CallResponse, CallError> {
        config.merge_defaults(&self.defaults);

        let mut outcome = self.dispatch(config).await;
        for interceptor in &self.response_interceptors {
            outcome = match outcome {
                Ok(response) => interceptor.on_response(response).await,
                Err(error) => interceptor.on_error(error).await,
            };
        }
        outcome
    }

    async fn dispatch(&self, mut config: CallConfig) -> Result<CallResponse, CallError> {
        for interceptor in &self.request_interceptors {
            config = interceptor.on_request(config).await?;
        }

        let request = match self.build_request(&config) {
            Ok(request) => request,
            Err(error) => return Err(error.with_config(config)),
        };
        let handle = RequestHandle::from_request(&request);

        tracing::trace!(
            method = %handle.method,
            url = %handle.url,
            "Dispatching call"
        );

        let response = match self.inner.execute(request).await {
            Ok(response) => response,
            Err(e) => return Err(CallError::from_reqwest(e, config, Some(handle))),
        };

        let status = response.status();
        let headers = response.headers().clone();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return Err(CallError::from_reqwest(e, config, Some(handle))),
        };

        let response = CallResponse {
            status,
            status_text: status.canonical_reason().map(str::to_string),
            data: decode_body(&headers, text),
            headers,
            config,
            request: handle,
        };

        if status.is_success() {
            Ok(response)
        } else {
            let message = format!("Request failed with status code {}", status.as_u16());
            Err(CallError::new(CallErrorKind::Status, message)
                .with_config(response.config.clone())
                .with_request(response.request.clone())
                .with_response(response))
        }
    }

    fn build_request(&self, config: &CallConfig) -> Result<reqwest::Request, CallError> {
        let full_url = config.full_url();
        let mut url = Url::parse(&full_url).map_err(|e| {
            CallError::new(CallErrorKind::Build, format!("Invalid URL '{}': {}", full_url, e))
        })?;

        if !config.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &config.params {
                match value {
                    Value::Null => {}
                    Value::Array(items) => {
                        for item in items {
                            pairs.append_pair(key, &query_value(item));
                        }
                    }
                    other => {
                        pairs.append_pair(key, &query_value(other));
                    }
                }
            }
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                CallError::new(CallErrorKind::Build, format!("Invalid header name '{}': {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                CallError::new(CallErrorKind::Build, format!("Invalid value for header '{}': {}", name, e))
            })?;
            headers.insert(name, value);
        }

        let mut builder = self.inner.request(config.method.clone(), url).headers(headers);
        if let Some(data) = &config.data {
            builder = builder.body(data.clone());
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        builder
            .build()
            .map_err(|e| CallError::new(CallErrorKind::Build, e.to_string()))
    }
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Interceptable for HttpClient {
    fn use_request(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
        self.request_interceptors.push(interceptor);
    }

    fn use_response(&mut self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.response_interceptors.push(interceptor);
    }

    fn wrap_derive<F>(&mut self, wrap: F) -> bool
    where
        F: FnOnce(Option<DeriveHook>) -> DeriveHook,
    {
        let current = self.derive_hook.take();
        self.derive_hook = Some(wrap(current));
        true
    }
}
