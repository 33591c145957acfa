//! In-memory record storage.
//!
//! One ordered map per [`Collection`] behind a tokio `RwLock`. Records do not
//! survive a restart.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{Collection, RecordKey, StorageError, StorageProvider};

/// Thread-safe in-memory storage. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    collections: Arc<RwLock<HashMap<Collection, BTreeMap<String, Value>>>>,
}

/// Record counts, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InMemoryStorageStats {
    pub tenants: usize,
    pub collections: usize,
    pub records: usize,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn stats(&self) -> InMemoryStorageStats {
        let collections = self.collections.read().await;
        let tenants: HashSet<&str> = collections.keys().map(Collection::tenant_id).collect();
        InMemoryStorageStats {
            tenants: tenants.len(),
            collections: collections.len(),
            records: collections.values().map(BTreeMap::len).sum(),
        }
    }
}

fn entries<'a>(
    collection: &'a Collection,
    records: impl Iterator<Item = (&'a String, &'a Value)>,
) -> Vec<(RecordKey, Value)> {
    records
        .map(|(id, data)| (collection.key(id.as_str()), data.clone()))
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl StorageProvider for InMemoryStorage {
    type Error = StorageError;

    async fn put(&self, key: &RecordKey, data: Value) -> Result<(), Self::Error> {
        if !data.is_object() {
            return Err(StorageError::NotAnObject {
                key: key.to_string(),
                kind: json_kind(&data),
            });
        }
        self.collections
            .write()
            .await
            .entry(key.collection().clone())
            .or_default()
            .insert(key.id().to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<Value>, Self::Error> {
        Ok(self
            .collections
            .read()
            .await
            .get(key.collection())
            .and_then(|records| records.get(key.id()))
            .cloned())
    }

    async fn delete(&self, key: &RecordKey) -> Result<bool, Self::Error> {
        let mut collections = self.collections.write().await;
        let Some(records) = collections.get_mut(key.collection()) else {
            return Ok(false);
        };
        let existed = records.remove(key.id()).is_some();
        if records.is_empty() {
            collections.remove(key.collection());
        }
        Ok(existed)
    }

    async fn scan(&self, collection: &Collection) -> Result<Vec<(RecordKey, Value)>, Self::Error> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|records| entries(collection, records.iter()))
            .unwrap_or_default())
    }

    async fn find_by_field(
        &self,
        collection: &Collection,
        field: &str,
        value: &str,
    ) -> Result<Vec<(RecordKey, Value)>, Self::Error> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|records| {
                entries(
                    collection,
                    records
                        .iter()
                        .filter(|(_, data)| data.get(field).and_then(Value::as_str) == Some(value)),
                )
            })
            .unwrap_or_default())
    }
}
