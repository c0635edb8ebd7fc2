//! Narrow document-store interface used by the quota pipeline.
//!
//! The gateway reads one global config record and one record per user, and
//! writes user records with merge semantics (last-write-wins per field). The
//! [`DocumentStore`] trait is the only storage surface the pipeline sees, so
//! tests substitute [`MemoryStore`] and production uses [`JsonFileStore`].

mod json_file;

pub use json_file::JsonFileStore;

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{GateError, Result};

/// Collection holding the global gateway configuration.
pub const CONFIG_COLLECTION: &str = "config";
/// Collection holding one usage record per user.
pub const USERS_COLLECTION: &str = "users";

/// Keyed read/write access to JSON documents, grouped by collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document. Returns `Ok(None)` when the key is absent.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>>;

    /// Merge `patch` into the document at `key`, creating it if absent.
    ///
    /// Merge is shallow: top-level fields of `patch` overwrite the stored
    /// fields of the same name, other stored fields are kept.
    async fn merge(&self, collection: &str, key: &str, patch: Value) -> Result<()>;
}

/// Merge `patch` into `target` at the top level.
///
/// Non-object targets are replaced wholesale, matching document-store
/// set-with-merge semantics.
pub(crate) fn merge_document(target: &mut Value, patch: Value) {
    match (target.as_object_mut(), patch) {
        (Some(existing), Value::Object(fields)) => {
            for (k, v) in fields {
                existing.insert(k, v);
            }
        }
        (_, patch) => *target = patch,
    }
}

/// In-memory [`DocumentStore`] for tests and local development.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<(String, String), Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>> {
        let guard = self
            .documents
            .read()
            .map_err(|_| GateError::Storage("store lock poisoned".into()))?;
        Ok(guard.get(&(collection.to_string(), key.to_string())).cloned())
    }

    async fn merge(&self, collection: &str, key: &str, patch: Value) -> Result<()> {
        let mut guard = self
            .documents
            .write()
            .map_err(|_| GateError::Storage("store lock poisoned".into()))?;
        let entry = guard
            .entry((collection.to_string(), key.to_string()))
            .or_insert_with(|| Value::Object(Default::default()));
        merge_document(entry, patch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_absent_key_returns_none() {
        let store = MemoryStore::new();
        let doc = store.get(USERS_COLLECTION, "nobody").await.unwrap();
        assert!(doc.is_none());
    }

    #[tokio::test]
    async fn test_merge_creates_document() {
        let store = MemoryStore::new();
        store
            .merge(USERS_COLLECTION, "alice", json!({ "dailyRequestCount": 1 }))
            .await
            .unwrap();
        let doc = store.get(USERS_COLLECTION, "alice").await.unwrap().unwrap();
        assert_eq!(doc["dailyRequestCount"], 1);
    }

    #[tokio::test]
    async fn test_merge_keeps_untouched_fields() {
        let store = MemoryStore::new();
        store
            .merge(
                USERS_COLLECTION,
                "alice",
                json!({ "dailyRequestCount": 3, "totalRequest": 40 }),
            )
            .await
            .unwrap();
        store
            .merge(USERS_COLLECTION, "alice", json!({ "dailyRequestCount": 4 }))
            .await
            .unwrap();

        let doc = store.get(USERS_COLLECTION, "alice").await.unwrap().unwrap();
        assert_eq!(doc["dailyRequestCount"], 4);
        assert_eq!(doc["totalRequest"], 40, "merge must not drop other fields");
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = MemoryStore::new();
        store
            .merge(CONFIG_COLLECTION, "gpt", json!({ "userMaxRequests": 5 }))
            .await
            .unwrap();
        let doc = store.get(USERS_COLLECTION, "gpt").await.unwrap();
        assert!(doc.is_none(), "same key in another collection must be absent");
    }

    #[test]
    fn test_merge_document_replaces_non_object_target() {
        let mut target = json!("scalar");
        merge_document(&mut target, json!({ "a": 1 }));
        assert_eq!(target, json!({ "a": 1 }));
    }
}
