//! Sink selection by target URL scheme.
//!
//! - `memory://<name>` opens (or reuses) a named in-memory store
//! - `file:///<dir>` opens a JSON-lines store rooted at `<dir>`

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use dashmap::DashMap;
use url::Url;

use crate::sink::jsonl::JsonlSink;
use crate::sink::memory::MemorySink;
use crate::sink::{SinkConnector, SinkError, SinkHandle, SinkOptions, SinkResult};

/// Connector for the built-in stores.
///
/// Memory stores are scoped to the connector: two targets naming the same
/// store through one connector see the same documents.
#[derive(Clone, Default)]
pub struct DefaultConnector {
    memory: Arc<DashMap<String, MemorySink>>,
}

impl DefaultConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide connector used by [`attach`](crate::attach).
    ///
    /// Memory stores opened through `attach` are reachable here.
    pub fn shared() -> &'static DefaultConnector {
        static SHARED: OnceLock<DefaultConnector> = OnceLock::new();
        SHARED.get_or_init(DefaultConnector::new)
    }

    /// The named memory store, created on first use.
    pub fn memory_sink(&self, name: &str) -> MemorySink {
        self.memory.entry(name.to_string()).or_default().clone()
    }
}

#[async_trait]
impl SinkConnector for DefaultConnector {
    async fn connect(&self, target: &str, options: &SinkOptions) -> SinkResult<Arc<dyn SinkHandle>> {
        let url = Url::parse(target).map_err(|e| SinkError::InvalidTarget {
            target: target.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "memory" => {
                let name = url.host_str().filter(|h| !h.is_empty()).unwrap_or("default");
                tracing::debug!(store = %name, "Opening memory sink");
                let handle: Arc<dyn SinkHandle> = Arc::new(self.memory_sink(name));
                Ok(handle)
            }
            "file" => {
                let root = url.to_file_path().map_err(|_| SinkError::InvalidTarget {
                    target: target.to_string(),
                    reason: "not a local directory path".to_string(),
                })?;
                let create_dirs = options
                    .get("create_dirs")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(true);
                tracing::debug!(root = %root.display(), create_dirs, "Opening JSON-lines sink");
                let handle: Arc<dyn SinkHandle> = Arc::new(JsonlSink::open(root, create_dirs).await?);
                Ok(handle)
            }
            other => Err(SinkError::UnsupportedScheme(other.to_string())),
        }
    }
}
