//! JSON-lines file store: one `<collection>.jsonl` per collection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::pipeline::LogRecord;
use crate::sink::{Collection, RecordId, SinkError, SinkHandle, SinkResult};

/// Store rooted at a directory. Handles to one collection share a write lock.
#[derive(Clone)]
pub struct JsonlSink {
    root: PathBuf,
    collections: Arc<DashMap<String, Arc<JsonlCollection>>>,
}

impl JsonlSink {
    /// Open a store at `root`, creating the directory when `create_dirs` is set.
    pub async fn open(root: impl Into<PathBuf>, create_dirs: bool) -> SinkResult<Self> {
        let root = root.into();
        if create_dirs {
            fs::create_dir_all(&root).await?;
        } else if !fs::try_exists(&root).await? {
            return Err(SinkError::InvalidTarget {
                target: root.display().to_string(),
                reason: "directory does not exist".to_string(),
            });
        }
        Ok(Self {
            root,
            collections: Arc::new(DashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl SinkHandle for JsonlSink {
    async fn collection(&self, name: &str) -> SinkResult<Arc<dyn Collection>> {
        let collection: Arc<dyn Collection> = self
            .collections
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(JsonlCollection {
                    path: self.root.join(format!("{}.jsonl", name)),
                    write_lock: Mutex::new(()),
                })
            })
            .clone();
        Ok(collection)
    }
}

pub struct JsonlCollection {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlCollection {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Collection for JsonlCollection {
    async fn insert_one(&self, record: &LogRecord) -> SinkResult<RecordId> {
        let id = RecordId::new();

        let mut document = match serde_json::to_value(record)? {
            Value::Object(map) => map,
            other => {
                return Err(SinkError::Rejected(format!(
                    "record serialized to {} instead of an object",
                    other
                )))
            }
        };
        document.insert("_id".to_string(), serde_json::to_value(&id)?);

        let mut line = serde_json::to_vec(&document)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        Ok(id)
    }
}
