//! Document, filter and batch types
//!
//! This module defines the values exchanged with a document store: JSON
//! documents addressed by collection and id, equality filters, and write
//! batches that are applied all-or-nothing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{StoreError, StoreResult};

/// Maximum number of operations one batch may carry.
pub const MAX_BATCH_OPERATIONS: usize = 500;

/// A stored document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Document id within its collection.
    pub id: String,
    /// Document body (always a JSON object).
    pub data: Value,
}

impl Document {
    /// Create a document.
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self { id: id.into(), data }
    }

    /// Deserialize the body into an entity.
    pub fn parse<T: DeserializeOwned>(&self) -> StoreResult<T> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            StoreError::Serialization(format!("document {}: {}", self.id, e))
        })
    }
}

/// Serialize an entity into a document body.
pub fn to_document<T: Serialize>(entity: &T) -> StoreResult<Value> {
    let value = serde_json::to_value(entity).map_err(|e| StoreError::Serialization(e.to_string()))?;
    if !value.is_object() {
        return Err(StoreError::InvalidDocument(
            "entities must serialize to JSON objects".to_string(),
        ));
    }
    Ok(value)
}

/// Deserialize a list of documents into entities.
///
/// Fails on the first document that does not parse.
pub fn parse_documents<T: DeserializeOwned>(documents: &[Document]) -> StoreResult<Vec<T>> {
    documents.iter().map(Document::parse).collect()
}

/// Equality filter on a top-level field.
///
/// # Example
///
/// ```
/// use console_store::Filter;
///
/// let filter = Filter::eq("role_id", "moderator");
/// assert!(filter.matches(&serde_json::json!({"role_id": "moderator"})));
/// assert!(!filter.matches(&serde_json::json!({"role_id": "admin"})));
/// assert!(!filter.matches(&serde_json::json!({})));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Filter {
    /// Field name.
    pub field: String,
    /// Value the field must equal.
    pub value: Value,
}

impl Filter {
    /// Create an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Check a document body against this filter.
    pub fn matches(&self, data: &Value) -> bool {
        data.get(&self.field) == Some(&self.value)
    }
}

/// One write inside a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BatchOp {
    /// Create or replace a document.
    Set {
        collection: String,
        id: String,
        data: Value,
    },
    /// Create a document or merge fields into it.
    Merge {
        collection: String,
        id: String,
        fields: Value,
    },
    /// Remove a document (no-op when absent).
    Delete { collection: String, id: String },
}

impl BatchOp {
    /// Collection this operation writes to.
    pub fn collection(&self) -> &str {
        match self {
            BatchOp::Set { collection, .. }
            | BatchOp::Merge { collection, .. }
            | BatchOp::Delete { collection, .. } => collection,
        }
    }
}

/// Ordered set of writes committed together.
///
/// A store applies either every operation of a committed batch or none of
/// them, and concurrent readers never observe a partially applied batch.
///
/// # Example
///
/// ```
/// use console_store::WriteBatch;
///
/// let mut batch = WriteBatch::new();
/// batch
///     .set("roles", "admin", serde_json::json!({"name": "Administrator"}))
///     .delete("roles", "legacy");
/// assert_eq!(batch.len(), 2);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WriteBatch {
    operations: Vec<BatchOp>,
}

impl WriteBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a create-or-replace.
    pub fn set(&mut self, collection: impl Into<String>, id: impl Into<String>, data: Value) -> &mut Self {
        self.operations.push(BatchOp::Set {
            collection: collection.into(),
            id: id.into(),
            data,
        });
        self
    }

    /// Queue a create-or-replace of a serialized entity.
    pub fn set_entity<T: Serialize>(
        &mut self,
        collection: impl Into<String>,
        id: impl Into<String>,
        entity: &T,
    ) -> StoreResult<&mut Self> {
        let data = to_document(entity)?;
        Ok(self.set(collection, id, data))
    }

    /// Queue a merge-upsert.
    pub fn merge(&mut self, collection: impl Into<String>, id: impl Into<String>, fields: Value) -> &mut Self {
        self.operations.push(BatchOp::Merge {
            collection: collection.into(),
            id: id.into(),
            fields,
        });
        self
    }

    /// Queue a merge-upsert of a serialized entity.
    pub fn merge_entity<T: Serialize>(
        &mut self,
        collection: impl Into<String>,
        id: impl Into<String>,
        entity: &T,
    ) -> StoreResult<&mut Self> {
        let fields = to_document(entity)?;
        Ok(self.merge(collection, id, fields))
    }

    /// Queue a delete.
    pub fn delete(&mut self, collection: impl Into<String>, id: impl Into<String>) -> &mut Self {
        self.operations.push(BatchOp::Delete {
            collection: collection.into(),
            id: id.into(),
        });
        self
    }

    /// Number of queued operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Queued operations in order.
    pub fn operations(&self) -> &[BatchOp] {
        &self.operations
    }

    /// Consume the batch into its operations.
    pub fn into_operations(self) -> Vec<BatchOp> {
        self.operations
    }
}
