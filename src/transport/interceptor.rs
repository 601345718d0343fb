//! Interceptor hooks and the capability to register them.

use std::sync::Arc;

use async_trait::async_trait;

use crate::transport::client::DeriveHook;
use crate::transport::config::CallConfig;
use crate::transport::error::CallError;
use crate::transport::response::CallResponse;

/// Runs before dispatch and may rewrite the call.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn on_request(&self, config: CallConfig) -> Result<CallConfig, CallError>;
}

/// Runs after the call completed or failed.
///
/// Returning `Err` from `on_response` turns the call into a failure;
/// returning `Ok` from `on_error` recovers it.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    async fn on_response(&self, response: CallResponse) -> Result<CallResponse, CallError> {
        Ok(response)
    }

    async fn on_error(&self, error: CallError) -> Result<CallResponse, CallError> {
        Err(error)
    }
}

/// A client instance that accepts interceptors.
pub trait Interceptable: Sized {
    fn use_request(&mut self, interceptor: Arc<dyn RequestInterceptor>);

    fn use_response(&mut self, interceptor: Arc<dyn ResponseInterceptor>);

    /// Replace the instance's derivation hook with `wrap(current)`.
    ///
    /// Returns false when the host cannot derive new instances.
    fn wrap_derive<F>(&mut self, _wrap: F) -> bool
    where
        F: FnOnce(Option<DeriveHook>) -> DeriveHook,
    {
        false
    }
}
