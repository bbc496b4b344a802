//! Document store abstraction
//!
//! This module provides the [`DocumentStore`] trait used by every console
//! service to read and write collections of JSON documents.

use crate::types::{Document, Filter, WriteBatch};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Document store error types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Document does not exist
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// Backend could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Batch exceeds the per-commit operation limit
    #[error("Batch too large: {size} operations (max {max})")]
    BatchTooLarge { size: usize, max: usize },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Document body is not usable
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl StoreError {
    /// Whether the error is a missing document.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub(crate) fn not_found(collection: &str, id: &str) -> Self {
        StoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

/// Result type for document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store trait for collection-based persistence.
///
/// Collections hold JSON object documents keyed by string id. Single-document
/// writes are atomic; multi-document writes go through [`WriteBatch`] and
/// [`DocumentStore::commit`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Create or replace a document.
    async fn set(&self, collection: &str, id: &str, data: Value) -> StoreResult<()>;

    /// Create a document or shallow-merge fields into the existing one.
    async fn merge(&self, collection: &str, id: &str, fields: Value) -> StoreResult<()>;

    /// Shallow-merge fields into an existing document.
    ///
    /// Fails with [`StoreError::NotFound`] when the document is absent.
    async fn update(&self, collection: &str, id: &str, fields: Value) -> StoreResult<()>;

    /// Remove a document. Deleting an absent document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Read every document of a collection, ordered by id.
    async fn list(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// Read the documents matching every filter, ordered by id.
    async fn query(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Document>>;

    /// Apply a batch atomically.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;

    /// Generate a fresh document id.
    fn generate_id(&self) -> String {
        uuid::Uuid::now_v7().to_string()
    }

    /// Get store stats.
    async fn stats(&self) -> StoreStats;
}

/// Document store statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Single-document reads
    pub reads: u64,
    /// Single-document writes
    pub writes: u64,
    /// List and query calls
    pub queries: u64,
    /// Batches committed
    pub batches_committed: u64,
    /// Operations refused or failed
    pub failed_operations: u64,
}

/// Shallow-merge `fields` into `target`.
pub(crate) fn merge_fields(target: &mut Value, fields: &Value) -> StoreResult<()> {
    let incoming = fields
        .as_object()
        .ok_or_else(|| StoreError::InvalidDocument("merge fields must be a JSON object".to_string()))?;
    let existing = target
        .as_object_mut()
        .ok_or_else(|| StoreError::InvalidDocument("stored document is not a JSON object".to_string()))?;
    for (key, value) in incoming {
        existing.insert(key.clone(), value.clone());
    }
    Ok(())
}
