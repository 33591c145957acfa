//! Record storage for the registry.
//!
//! Records are JSON objects grouped into a [`Collection`] per tenant, and
//! addressed by a [`RecordKey`] inside it. Backends know nothing about
//! applications: name uniqueness, system applications and identifier
//! allocation live in the provider layer.
//!
//! ```rust
//! use app_registry::storage::{Collection, InMemoryStorage, StorageProvider};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = InMemoryStorage::new();
//! let applications = Collection::new("carbon.super", "Application");
//!
//! let key = applications.key("85e3f0a5");
//! storage.put(&key, json!({"id": "85e3f0a5", "name": "Pickup"})).await?;
//!
//! assert_eq!(storage.find_by_field(&applications, "name", "Pickup").await?.len(), 1);
//! assert!(storage.delete(&key).await?);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;


pub use errors::StorageError;
pub use in_memory::{InMemoryStorage, InMemoryStorageStats};

use serde_json::Value;
use std::fmt;
use std::future::Future;

/// All records of one kind within one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Collection {
    tenant_id: String,
    name: String,
}

impl Collection {
    pub fn new(tenant_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            name: name.into(),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key of the record `id` in this collection.
    pub fn key(&self, id: impl Into<String>) -> RecordKey {
        RecordKey {
            collection: self.clone(),
            id: id.into(),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant_id, self.name)
    }
}

/// Address of a single record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    collection: Collection,
    id: String,
}

impl RecordKey {
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn tenant_id(&self) -> &str {
        self.collection.tenant_id()
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Persistence backend for registry records.
///
/// A completed `put` is visible to the next read. Every operation is scoped
/// to the tenant of its key or collection.
pub trait StorageProvider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store `data` at `key`, replacing any previous record.
    fn put(
        &self,
        key: &RecordKey,
        data: Value,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn get(
        &self,
        key: &RecordKey,
    ) -> impl Future<Output = Result<Option<Value>, Self::Error>> + Send;

    /// Remove the record. Returns whether it existed.
    fn delete(&self, key: &RecordKey) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Every record of the collection, ordered by record id.
    fn scan(
        &self,
        collection: &Collection,
    ) -> impl Future<Output = Result<Vec<(RecordKey, Value)>, Self::Error>> + Send;

    /// Records whose top-level string `field` equals `value` exactly.
    fn find_by_field(
        &self,
        collection: &Collection,
        field: &str,
        value: &str,
    ) -> impl Future<Output = Result<Vec<(RecordKey, Value)>, Self::Error>> + Send;
}
