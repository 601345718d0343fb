//! Persistence sinks for call records.
//!
//! # Data Flow
//! ```text
//! LoggerConfig.sink_target + sink_options
//!     → SinkConnector::connect (connector.rs picks by URL scheme)
//!     → SinkHandle::collection(name)
//!     → Collection::insert_one(record) → RecordId
//! ```
//!
//! # Design Decisions
//! - The pipeline only sees the three traits; storage is opaque
//! - Insert returns the identifier the store assigned, never one the caller chose
//! - Built-in stores: process memory and JSON-lines files

pub mod connector;
pub mod jsonl;
pub mod memory;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::pipeline::LogRecord;

pub use connector::DefaultConnector;
pub use jsonl::JsonlSink;
pub use memory::MemorySink;

/// Free-form options handed to the connector untouched.
pub type SinkOptions = Map<String, Value>;

/// Identifier assigned to a persisted record.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RecordId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

/// Errors raised by sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Invalid sink target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("Unsupported sink scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("Sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Sink rejected record: {0}")]
    Rejected(String),
}

pub type SinkResult<T> = Result<T, SinkError>;

/// Opens handles to a document store.
#[async_trait]
pub trait SinkConnector: Send + Sync {
    async fn connect(&self, target: &str, options: &SinkOptions) -> SinkResult<Arc<dyn SinkHandle>>;
}

/// An open connection to a document store.
#[async_trait]
pub trait SinkHandle: Send + Sync {
    async fn collection(&self, name: &str) -> SinkResult<Arc<dyn Collection>>;
}

/// A named set of documents accepting inserts.
#[async_trait]
pub trait Collection: Send + Sync {
    async fn insert_one(&self, record: &LogRecord) -> SinkResult<RecordId>;
}
