//! In-memory document store
//!
//! Suitable for single-process deployments and testing. Collections can be
//! marked unavailable to exercise the fail-closed and fail-soft paths of the
//! services built on top of the store.

use crate::store::{merge_fields, DocumentStore, StoreError, StoreResult, StoreStats};
use crate::types::{BatchOp, Document, Filter, WriteBatch, MAX_BATCH_OPERATIONS};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

type Collections = HashMap<String, BTreeMap<String, Value>>;

/// In-memory document store implementation.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    /// Collection name -> id -> body
    collections: Arc<RwLock<Collections>>,
    /// Collections that refuse every operation
    unavailable: Arc<RwLock<HashSet<String>>>,
    /// Statistics
    stats: Arc<RwLock<StoreStats>>,
}

impl std::fmt::Debug for MemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDocumentStore").finish_non_exhaustive()
    }
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a collection unavailable (or available again).
    ///
    /// While unavailable, every operation touching the collection fails with
    /// [`StoreError::Unavailable`].
    pub async fn set_unavailable(&self, collection: &str, unavailable: bool) {
        let mut set = self.unavailable.write().await;
        if unavailable {
            set.insert(collection.to_string());
        } else {
            set.remove(collection);
        }
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    async fn ensure_available(&self, collection: &str) -> StoreResult<()> {
        if self.unavailable.read().await.contains(collection) {
            self.stats.write().await.failed_operations += 1;
            warn!(collection = %collection, "Collection unavailable");
            return Err(StoreError::Unavailable(format!("collection '{}' is unavailable", collection)));
        }
        Ok(())
    }

    async fn record_failure(&self) {
        self.stats.write().await.failed_operations += 1;
    }

    fn ensure_object(value: &Value) -> StoreResult<()> {
        if value.is_object() {
            Ok(())
        } else {
            Err(StoreError::InvalidDocument("documents must be JSON objects".to_string()))
        }
    }

    fn validate_batch(collections: &Collections, operations: &[BatchOp]) -> StoreResult<()> {
        for op in operations {
            match op {
                BatchOp::Set { data, .. } => Self::ensure_object(data)?,
                BatchOp::Merge { collection, id, fields } => {
                    Self::ensure_object(fields)?;
                    if let Some(existing) = collections.get(collection).and_then(|c| c.get(id)) {
                        Self::ensure_object(existing)?;
                    }
                }
                BatchOp::Delete { .. } => {}
            }
        }
        Ok(())
    }

    fn apply(collections: &mut Collections, op: BatchOp) -> StoreResult<()> {
        match op {
            BatchOp::Set { collection, id, data } => {
                collections.entry(collection).or_default().insert(id, data);
            }
            BatchOp::Merge { collection, id, fields } => {
                let docs = collections.entry(collection).or_default();
                match docs.get_mut(&id) {
                    Some(existing) => merge_fields(existing, &fields)?,
                    None => {
                        docs.insert(id, fields);
                    }
                }
            }
            BatchOp::Delete { collection, id } => {
                if let Some(docs) = collections.get_mut(&collection) {
                    docs.remove(&id);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.ensure_available(collection).await?;
        self.stats.write().await.reads += 1;

        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    async fn set(&self, collection: &str, id: &str, data: Value) -> StoreResult<()> {
        self.ensure_available(collection).await?;
        if let Err(e) = Self::ensure_object(&data) {
            self.record_failure().await;
            return Err(e);
        }

        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
        self.stats.write().await.writes += 1;
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, fields: Value) -> StoreResult<()> {
        self.ensure_available(collection).await?;
        let op = BatchOp::Merge {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        };

        let result = {
            let mut collections = self.collections.write().await;
            Self::validate_batch(&collections, std::slice::from_ref(&op))
                .and_then(|_| Self::apply(&mut collections, op))
        };
        match result {
            Ok(()) => self.stats.write().await.writes += 1,
            Err(_) => self.record_failure().await,
        }
        result
    }

    async fn update(&self, collection: &str, id: &str, fields: Value) -> StoreResult<()> {
        self.ensure_available(collection).await?;

        let result = {
            let mut collections = self.collections.write().await;
            match collections.get_mut(collection).and_then(|docs| docs.get_mut(id)) {
                Some(existing) => merge_fields(existing, &fields),
                None => Err(StoreError::not_found(collection, id)),
            }
        };
        match result {
            Ok(()) => self.stats.write().await.writes += 1,
            Err(_) => self.record_failure().await,
        }
        result
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.ensure_available(collection).await?;

        if let Some(docs) = self.collections.write().await.get_mut(collection) {
            docs.remove(id);
        }
        self.stats.write().await.writes += 1;
        Ok(())
    }

    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.query(collection, &[]).await
    }

    async fn query(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Document>> {
        self.ensure_available(collection).await?;
        self.stats.write().await.queries += 1;

        let collections = self.collections.read().await;
        let documents = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, data)| filters.iter().all(|f| f.matches(data)))
                    .map(|(id, data)| Document::new(id.clone(), data.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(documents)
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.len() > MAX_BATCH_OPERATIONS {
            self.record_failure().await;
            return Err(StoreError::BatchTooLarge {
                size: batch.len(),
                max: MAX_BATCH_OPERATIONS,
            });
        }
        {
            let touched: HashSet<&str> = batch.operations().iter().map(BatchOp::collection).collect();
            for collection in touched {
                self.ensure_available(collection).await?;
            }
        }

        let size = batch.len();
        let result = {
            let mut collections = self.collections.write().await;
            match Self::validate_batch(&collections, batch.operations()) {
                Ok(()) => {
                    // Validation above guarantees every apply succeeds.
                    batch
                        .into_operations()
                        .into_iter()
                        .try_for_each(|op| Self::apply(&mut collections, op))
                }
                Err(e) => Err(e),
            }
        };

        match &result {
            Ok(()) => {
                self.stats.write().await.batches_committed += 1;
                debug!(operations = size, "Batch committed");
            }
            Err(e) => {
                self.record_failure().await;
                warn!(error = %e, "Batch rejected");
            }
        }
        result
    }

    async fn stats(&self) -> StoreStats {
        self.stats.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryDocumentStore::new();
        store.set("roles", "admin", json!({"name": "Administrator"})).await.unwrap();

        let doc = store.get("roles", "admin").await.unwrap().unwrap();
        assert_eq!(doc.data["name"], "Administrator");

        store.delete("roles", "admin").await.unwrap();
        assert!(store.get("roles", "admin").await.unwrap().is_none());

        // Deleting again is fine
        store.delete("roles", "admin").await.unwrap();
    }

    #[tokio::test]
    async fn test_set_rejects_non_objects() {
        let store = MemoryDocumentStore::new();
        let err = store.set("roles", "x", json!("text")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidDocument(_)));
        assert_eq!(store.stats().await.failed_operations, 1);
    }

    #[tokio::test]
    async fn test_merge_upserts() {
        let store = MemoryDocumentStore::new();
        store.merge("users", "u1", json!({"email": "a@example.com"})).await.unwrap();
        store.merge("users", "u1", json!({"status": "banned"})).await.unwrap();

        let doc = store.get("users", "u1").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"email": "a@example.com", "status": "banned"}));
    }

    #[tokio::test]
    async fn test_update_requires_existing() {
        let store = MemoryDocumentStore::new();
        let err = store.update("users", "missing", json!({"status": "banned"})).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_query_filters_and_orders_by_id() {
        let store = MemoryDocumentStore::new();
        store.set("rows", "b", json!({"role_id": "mod", "n": 2})).await.unwrap();
        store.set("rows", "a", json!({"role_id": "mod", "n": 1})).await.unwrap();
        store.set("rows", "c", json!({"role_id": "user", "n": 3})).await.unwrap();

        let docs = store.query("rows", &[Filter::eq("role_id", "mod")]).await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert_eq!(store.list("rows").await.unwrap().len(), 3);
        assert!(store.list("empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_applies_everything() {
        let store = MemoryDocumentStore::new();
        store.set("rows", "old", json!({"n": 0})).await.unwrap();

        let mut batch = WriteBatch::new();
        batch
            .set("rows", "a", json!({"n": 1}))
            .merge("rows", "a", json!({"m": 2}))
            .delete("rows", "old");
        store.commit(batch).await.unwrap();

        let doc = store.get("rows", "a").await.unwrap().unwrap();
        assert_eq!(doc.data, json!({"n": 1, "m": 2}));
        assert!(store.get("rows", "old").await.unwrap().is_none());
        assert_eq!(store.stats().await.batches_committed, 1);
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let store = MemoryDocumentStore::new();

        let mut batch = WriteBatch::new();
        batch
            .set("rows", "a", json!({"n": 1}))
            .merge("rows", "b", json!("not an object"));
        assert!(store.commit(batch).await.is_err());
        assert!(store.get("rows", "a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_rejects_oversized_batch() {
        let store = MemoryDocumentStore::new();
        let mut batch = WriteBatch::new();
        for i in 0..=MAX_BATCH_OPERATIONS {
            batch.set("rows", format!("r{}", i), json!({}));
        }
        let err = store.commit(batch).await.unwrap_err();
        assert!(matches!(err, StoreError::BatchTooLarge { size: 501, max: 500 }));
        assert_eq!(store.count("rows").await, 0);
    }

    #[tokio::test]
    async fn test_unavailable_collection() {
        let store = MemoryDocumentStore::new();
        store.set("rows", "a", json!({})).await.unwrap();
        store.set_unavailable("rows", true).await;

        assert!(matches!(store.get("rows", "a").await, Err(StoreError::Unavailable(_))));
        assert!(matches!(store.list("rows").await, Err(StoreError::Unavailable(_))));

        let mut batch = WriteBatch::new();
        batch.set("other", "x", json!({})).set("rows", "b", json!({}));
        assert!(matches!(store.commit(batch).await, Err(StoreError::Unavailable(_))));
        assert_eq!(store.count("other").await, 0);

        store.set_unavailable("rows", false).await;
        assert!(store.get("rows", "a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_generate_id_is_unique() {
        let store = MemoryDocumentStore::new();
        assert_ne!(store.generate_id(), store.generate_id());
    }
}
