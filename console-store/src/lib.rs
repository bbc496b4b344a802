//! # Console Store
//!
//! This crate provides the document store abstraction the admin console
//! persists everything through.
//!
//! ## Overview
//!
//! The console-store crate handles:
//! - **Documents**: JSON objects addressed by collection and id
//! - **Queries**: Equality filters over top-level fields
//! - **Batches**: All-or-nothing multi-document writes (at most 500 operations)
//! - **Fault injection**: Collections can be marked unavailable in memory
//!
//! ## Features
//!
//! - `memory` (default): In-memory document store for single-process apps and tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use console_store::{DocumentStore, Filter, MemoryDocumentStore, WriteBatch};
//! use serde_json::json;
//!
//! async fn example() {
//!     let store = MemoryDocumentStore::new();
//!
//!     let mut batch = WriteBatch::new();
//!     batch
//!         .set("page_permissions", "moderator__admin_page", json!({"role_id": "moderator"}))
//!         .set("operation_permissions", "moderator_banUser_op", json!({"role_id": "moderator"}));
//!     store.commit(batch).await.unwrap();
//!
//!     let rows = store
//!         .query("page_permissions", &[Filter::eq("role_id", "moderator")])
//!         .await
//!         .unwrap();
//!     assert_eq!(rows.len(), 1);
//! }
//! ```

pub mod store;
pub mod types;

#[cfg(feature = "memory")]
pub mod memory;

// Re-export main types
pub use store::{DocumentStore, StoreError, StoreResult, StoreStats};
pub use types::{parse_documents, to_document, BatchOp, Document, Filter, WriteBatch, MAX_BATCH_OPERATIONS};

#[cfg(feature = "memory")]
pub use memory::MemoryDocumentStore;
