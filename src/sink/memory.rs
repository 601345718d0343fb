//! Process-local document store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use crate::pipeline::LogRecord;
use crate::sink::{Collection, RecordId, SinkHandle, SinkResult};

/// In-memory store; clones share the same collections.
#[derive(Clone, Default)]
pub struct MemorySink {
    collections: Arc<DashMap<String, Arc<MemoryCollection>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection `name`, created empty on first use.
    pub fn memory_collection(&self, name: &str) -> Arc<MemoryCollection> {
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCollection::default()))
            .clone()
    }

    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }
}

#[async_trait]
impl SinkHandle for MemorySink {
    async fn collection(&self, name: &str) -> SinkResult<Arc<dyn Collection>> {
        let collection: Arc<dyn Collection> = self.memory_collection(name);
        Ok(collection)
    }
}

/// Documents of one collection, kept in insertion order.
#[derive(Default)]
pub struct MemoryCollection {
    documents: Mutex<Vec<(RecordId, Value)>>,
}

impl MemoryCollection {
    pub fn len(&self) -> usize {
        self.documents.lock().expect("memory collection mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored document.
    pub fn documents(&self) -> Vec<(RecordId, Value)> {
        self.documents.lock().expect("memory collection mutex poisoned").clone()
    }

    pub fn find(&self, id: &RecordId) -> Option<Value> {
        self.documents
            .lock()
            .expect("memory collection mutex poisoned")
            .iter()
            .find(|(stored, _)| stored == id)
            .map(|(_, doc)| doc.clone())
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    async fn insert_one(&self, record: &LogRecord) -> SinkResult<RecordId> {
        let document = serde_json::to_value(record)?;
        let id = RecordId::new();
        self.documents
            .lock()
            .expect("memory collection mutex poisoned")
            .push((id.clone(), document));
        Ok(id)
    }
}
