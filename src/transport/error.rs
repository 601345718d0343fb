//! Transport failures.

use thiserror::Error;

use crate::sink::RecordId;
use crate::transport::config::CallConfig;
use crate::transport::response::{CallResponse, RequestHandle};

/// Where in the call a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallErrorKind {
    /// The request could not be formed (bad URL, invalid header).
    Build,
    /// Connection refused, reset, DNS failure.
    Connect,
    Timeout,
    /// The server answered with a non-2xx status.
    Status,
    /// Reading the response body failed.
    Body,
    /// An interceptor rejected the call.
    Interceptor,
}

/// A failed call, carrying whatever context existed at the point of failure.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CallError {
    pub kind: CallErrorKind,
    pub message: String,
    pub config: Option<CallConfig>,
    pub request: Option<RequestHandle>,
    pub response: Option<Box<CallResponse>>,
    record_id: Option<RecordId>,
}

impl CallError {
    pub fn new(kind: CallErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            config: None,
            request: None,
            response: None,
            record_id: None,
        }
    }

    pub fn with_config(mut self, config: CallConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_request(mut self, request: RequestHandle) -> Self {
        self.request = Some(request);
        self
    }

    pub fn with_response(mut self, response: CallResponse) -> Self {
        self.response = Some(Box::new(response));
        self
    }

    pub(crate) fn from_reqwest(
        err: reqwest::Error,
        config: CallConfig,
        request: Option<RequestHandle>,
    ) -> Self {
        let kind = if err.is_timeout() {
            CallErrorKind::Timeout
        } else if err.is_builder() {
            CallErrorKind::Build
        } else if err.is_body() || err.is_decode() {
            CallErrorKind::Body
        } else {
            CallErrorKind::Connect
        };
        let mut error = Self::new(kind, error_chain(&err)).with_config(config);
        error.request = request;
        error
    }

    /// Identifier of the log record written for this failure, if one was.
    pub fn record_id(&self) -> Option<&RecordId> {
        self.record_id.as_ref()
    }

    pub fn set_record_id(&mut self, id: RecordId) {
        self.record_id = Some(id);
    }

    /// HTTP status when the server answered.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        self.response.as_ref().map(|r| r.status)
    }
}

/// reqwest's top-level message is generic; the source chain says what happened.
fn error_chain(err: &reqwest::Error) -> String {
    use std::error::Error as _;

    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
