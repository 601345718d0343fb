//! User hooks that reshape decoded bodies before they are recorded.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::pipeline::codec::is_truthy;
use crate::transport::{CallConfig, CallResponse, RequestHandle};

/// What a request transform can see besides the body.
pub struct RequestContext<'a> {
    /// Absent when the call failed before a request was formed.
    pub request: Option<&'a RequestHandle>,
    pub config: &'a CallConfig,
}

/// What a response transform can see besides the body.
pub struct ResponseContext<'a> {
    pub response: &'a CallResponse,
    pub config: &'a CallConfig,
}

pub type RequestTransform = Arc<dyn Fn(Value, &RequestContext<'_>) -> Value + Send + Sync>;
pub type ResponseTransform = Arc<dyn Fn(Value, &ResponseContext<'_>) -> Value + Send + Sync>;

/// Optional body transforms. A missing transform is the identity.
#[derive(Clone, Default)]
pub struct Transforms {
    pub request: Option<RequestTransform>,
    pub response: Option<ResponseTransform>,
}

impl fmt::Debug for Transforms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transforms")
            .field("request", &self.request.is_some())
            .field("response", &self.response.is_some())
            .finish()
    }
}

impl Transforms {
    pub fn with_request<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value, &RequestContext<'_>) -> Value + Send + Sync + 'static,
    {
        self.request = Some(Arc::new(transform));
        self
    }

    pub fn with_response<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value, &ResponseContext<'_>) -> Value + Send + Sync + 'static,
    {
        self.response = Some(Arc::new(transform));
        self
    }

    /// Apply the request transform once, only to a present body.
    pub fn apply_request(&self, body: Value, context: &RequestContext<'_>) -> Value {
        match &self.request {
            Some(transform) if is_truthy(&body) => transform(body, context),
            _ => body,
        }
    }

    /// Apply the response transform once, only to a present body.
    pub fn apply_response(&self, body: Value, context: &ResponseContext<'_>) -> Value {
        match &self.response {
            Some(transform) if is_truthy(&body) => transform(body, context),
            _ => body,
        }
    }
}
