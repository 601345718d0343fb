//! Attaching the logging pipeline to client instances.
//!
//! # Responsibilities
//! - Open the sink collection once per `attach`
//! - Register the stamp step and the record step on a client
//! - Optionally wrap the client's derivation hook so derived instances are bound too
//!
//! # Design Decisions
//! - Successful calls are returned untouched after the record is written
//! - Failed calls are re-raised with the record identifier attached
//! - A sink failure is logged and counted, never substituted for the call's outcome
//! - Derived instances share the parent's logger and do not propagate further

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::validation::{format_errors, validate_config, ValidationError};
use crate::config::LoggerConfig;
use crate::observability::metrics;
use crate::pipeline::correlation;
use crate::pipeline::record::{Elapsed, LogRecord, RecordBuilder};
use crate::pipeline::transform::Transforms;
use crate::sink::{Collection, DefaultConnector, RecordId, SinkConnector, SinkError};
use crate::transport::{
    CallConfig, CallError, CallResponse, DeriveHook, HttpClient, Interceptable, RequestInterceptor,
    ResponseInterceptor,
};

/// Errors raised while attaching.
#[derive(Debug, Error)]
pub enum AttachError {
    #[error("Invalid logger configuration: {}", format_errors(.0))]
    Invalid(Vec<ValidationError>),

    #[error("Failed to open sink: {0}")]
    Sink(#[from] SinkError),
}

/// Shared state behind every instance bound by one `attach`.
struct CallLogger {
    collection: Arc<dyn Collection>,
    collection_name: String,
    namespace: String,
    transforms: Transforms,
}

impl CallLogger {
    fn builder(&self) -> RecordBuilder<'_> {
        RecordBuilder::new(&self.transforms, &self.namespace)
    }

    async fn persist(&self, record: &LogRecord) -> Option<RecordId> {
        let outcome = if record.error.is_some() { "failure" } else { "success" };

        if record.time == Elapsed::Unknown {
            tracing::warn!(
                method = %record.request.method,
                path = %record.request.path,
                namespace = %self.namespace,
                "Call finished without a start marker; elapsed time unknown"
            );
        }

        match self.collection.insert_one(record).await {
            Ok(id) => {
                metrics::record_persisted(outcome);
                if let Some(ms) = record.time.as_millis() {
                    metrics::record_call_duration(ms);
                }
                tracing::debug!(
                    record_id = %id,
                    collection = %self.collection_name,
                    method = %record.request.method,
                    path = %record.request.path,
                    outcome,
                    "Call record persisted"
                );
                Some(id)
            }
            Err(e) => {
                metrics::record_sink_failure();
                tracing::error!(
                    error = %e,
                    collection = %self.collection_name,
                    method = %record.request.method,
                    path = %record.request.path,
                    outcome,
                    "Failed to persist call record"
                );
                None
            }
        }
    }
}

/// Stamps each call before dispatch.
struct StampStep {
    logger: Arc<CallLogger>,
}

#[async_trait]
impl RequestInterceptor for StampStep {
    async fn on_request(&self, config: CallConfig) -> Result<CallConfig, CallError> {
        tracing::trace!(namespace = %self.logger.namespace, url = %config.url, "Stamping call");
        Ok(correlation::stamp(config, &self.logger.namespace))
    }
}

/// Builds and persists the record once the call has an outcome.
struct RecordStep {
    logger: Arc<CallLogger>,
}

#[async_trait]
impl ResponseInterceptor for RecordStep {
    async fn on_response(&self, response: CallResponse) -> Result<CallResponse, CallError> {
        let record = self.logger.builder().success(&response);
        self.logger.persist(&record).await;
        Ok(response)
    }

    async fn on_error(&self, mut error: CallError) -> Result<CallResponse, CallError> {
        let record = self.logger.builder().failure(&error);
        if let Some(id) = self.logger.persist(&record).await {
            error.set_record_id(id);
        }
        Err(error)
    }
}

/// An established binding. Cloning shares the same sink collection.
#[derive(Clone)]
pub struct Binding {
    logger: Arc<CallLogger>,
}

impl Binding {
    pub fn collection_name(&self) -> &str {
        &self.logger.collection_name
    }

    pub fn namespace(&self) -> &str {
        &self.logger.namespace
    }

    /// Register this binding's steps on one more instance.
    pub fn bind<C: Interceptable>(&self, client: &mut C) {
        client.use_request(Arc::new(StampStep {
            logger: self.logger.clone(),
        }));
        client.use_response(Arc::new(RecordStep {
            logger: self.logger.clone(),
        }));
    }

    /// Bind every instance `client` derives from now on.
    ///
    /// Derived instances are bound without propagation of their own.
    /// Returns false when the client cannot derive instances.
    pub fn propagate<C: Interceptable>(&self, client: &mut C) -> bool {
        let binding = self.clone();
        let wrapped = client.wrap_derive(move |previous| -> DeriveHook {
            Arc::new(move |child: HttpClient| {
                let mut child = match &previous {
                    Some(previous) => previous(child),
                    None => child,
                };
                binding.bind(&mut child);
                tracing::debug!(
                    collection = %binding.collection_name(),
                    "Bound derived client instance"
                );
                child
            })
        });

        if !wrapped {
            tracing::warn!(
                collection = %self.collection_name(),
                "Client cannot derive instances; propagation skipped"
            );
        }
        wrapped
    }
}

/// Attach a logger using the built-in sinks.
///
/// Memory targets resolve through [`DefaultConnector::shared`].
pub async fn attach<C: Interceptable>(client: &mut C, config: LoggerConfig) -> Result<Binding, AttachError> {
    attach_with(client, config, DefaultConnector::shared()).await
}

/// Attach a logger, opening the sink through `connector`.
pub async fn attach_with<C: Interceptable>(
    client: &mut C,
    config: LoggerConfig,
    connector: &dyn SinkConnector,
) -> Result<Binding, AttachError> {
    validate_config(&config).map_err(AttachError::Invalid)?;

    let handle = connector.connect(&config.sink_target, &config.sink_options).await?;
    let collection = handle.collection(&config.collection_name).await?;

    let binding = Binding {
        logger: Arc::new(CallLogger {
            collection,
            collection_name: config.collection_name.clone(),
            namespace: config.namespace.clone(),
            transforms: config.transforms.clone(),
        }),
    };

    binding.bind(client);
    if config.propagate_to_derived {
        binding.propagate(client);
    }

    tracing::info!(
        sink_scheme = %config.sink_scheme(),
        collection = %config.collection_name,
        propagate_to_derived = config.propagate_to_derived,
        "Call logger attached"
    );

    Ok(binding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::record::LogRecord;
    use crate::sink::{SinkHandle, SinkOptions, SinkResult};
    use crate::transport::CallErrorKind;

    #[derive(Default)]
    struct FakeHost {
        requests: Vec<Arc<dyn RequestInterceptor>>,
        responses: Vec<Arc<dyn ResponseInterceptor>>,
    }

    impl Interceptable for FakeHost {
        fn use_request(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
            self.requests.push(interceptor);
        }

        fn use_response(&mut self, interceptor: Arc<dyn ResponseInterceptor>) {
            self.responses.push(interceptor);
        }
    }

    struct RejectingSink;

    #[async_trait]
    impl SinkConnector for RejectingSink {
        async fn connect(&self, _: &str, _: &SinkOptions) -> SinkResult<Arc<dyn SinkHandle>> {
            Ok(Arc::new(RejectingSink))
        }
    }

    #[async_trait]
    impl SinkHandle for RejectingSink {
        async fn collection(&self, _: &str) -> SinkResult<Arc<dyn Collection>> {
            Ok(Arc::new(RejectingSink))
        }
    }

    #[async_trait]
    impl Collection for RejectingSink {
        async fn insert_one(&self, _: &LogRecord) -> SinkResult<RecordId> {
            Err(SinkError::Rejected("disk full".into()))
        }
    }

    #[tokio::test]
    async fn test_invalid_config_registers_nothing() {
        let mut host = FakeHost::default();
        let err = attach(&mut host, LoggerConfig::new("memory://x", ""))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AttachError::Invalid(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("collection name must not be empty"));
        assert!(host.requests.is_empty());
        assert!(host.responses.is_empty());
    }

    #[tokio::test]
    async fn test_propagation_on_host_without_derivation() {
        let mut host = FakeHost::default();
        let config = LoggerConfig::default().propagate_to_derived(true);
        let binding = attach(&mut host, config).await.unwrap();

        assert_eq!(host.requests.len(), 1);
        assert_eq!(host.responses.len(), 1);
        assert!(!binding.propagate(&mut host));
    }

    #[tokio::test]
    async fn test_failure_annotated_with_record_id() {
        let connector = DefaultConnector::new();
        let mut host = FakeHost::default();
        attach_with(&mut host, LoggerConfig::new("memory://t", "logs"), &connector)
            .await
            .unwrap();

        let config = host.requests[0]
            .on_request(CallConfig::get("http://localhost/path"))
            .await
            .unwrap();
        let error = CallError::new(CallErrorKind::Connect, "connection refused").with_config(config);
        let error = host.responses[0].on_error(error).await.err().unwrap();

        let id = error.record_id().cloned().unwrap();
        let stored = connector.memory_sink("t").memory_collection("logs").find(&id).unwrap();
        assert_eq!(stored["error"], "connection refused");
        assert!(stored["response"].is_null());
        assert_eq!(stored["request"]["path"], "/path");
        assert!(stored["time"].is_u64());
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_mask_error() {
        let mut host = FakeHost::default();
        attach_with(&mut host, LoggerConfig::default(), &RejectingSink)
            .await
            .unwrap();

        let error = CallError::new(CallErrorKind::Timeout, "timed out");
        let error = host.responses[0].on_error(error).await.err().unwrap();
        assert_eq!(error.message, "timed out");
        assert_eq!(error.kind, CallErrorKind::Timeout);
        assert!(error.record_id().is_none());
    }

    #[tokio::test]
    async fn test_connect_failure_surfaces() {
        let mut host = FakeHost::default();
        let err = attach(&mut host, LoggerConfig::new("mongodb://localhost:27017/", "logs"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AttachError::Sink(SinkError::UnsupportedScheme(_))));
        assert!(host.requests.is_empty());
    }
}
